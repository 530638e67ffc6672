//! The canonical internal order form produced by the processing pipeline.

use super::{Instrument, OptionType, OrderRequest, OrderStatus, OrderType, Side, TimeInForce};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Internal canonical order representation (spec.md §3 ProcessedOrder).
///
/// Created once by [`crate::processor::OrderProcessor`] and mutated only by
/// the [`crate::gateway::Gateway`] in response to matching execution reports.
/// Once [`ProcessedOrder::status`] becomes terminal no further mutation is
/// permitted — enforced by [`ProcessedOrder::apply_fill`] and
/// [`ProcessedOrder::transition_status`] returning `Err` rather than panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedOrder {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,

    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,

    pub instrument: Option<Instrument>,
    pub strike_price: Option<Decimal>,
    pub expiry_date: Option<chrono::NaiveDate>,
    pub option_type: Option<OptionType>,

    pub account: Option<String>,
    pub clearing_account: Option<String>,
    pub order_capacity: String,

    pub min_quantity: Option<i64>,
    pub max_show: Option<i64>,
    pub text: Option<String>,

    pub status: OrderStatus,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,

    pub filled_quantity: i64,
    pub remaining_quantity: i64,
    pub avg_price: Option<Decimal>,
    pub last_price: Option<Decimal>,
    pub last_quantity: Option<i64>,
}

/// Error returned when an attempted mutation would violate the terminal-state
/// invariant (spec.md §3: "once terminal, no further mutations").
#[derive(Debug, Clone, thiserror::Error)]
#[error("order {order_id} is already terminal ({status}); rejecting further mutation")]
pub struct TerminalOrderError {
    pub order_id: String,
    pub status: OrderStatus,
}

impl ProcessedOrder {
    /// Build a freshly-created order in `NEW` status from a validated request.
    ///
    /// `clearing_account` defaults from `account` when unset; `order_capacity`
    /// defaults to `"A"` unless `original_order_capacity` overrides it
    /// (spec.md §4.3 final enrichment step).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request: &OrderRequest,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        option_type: Option<OptionType>,
        instrument: Option<Instrument>,
        expiry_date: Option<chrono::NaiveDate>,
        now: DateTime<Utc>,
    ) -> Self {
        let account = request.account.clone();
        let clearing_account = account.clone();
        Self {
            order_id: request.order_id.clone(),
            client_order_id: request.effective_client_order_id().to_string(),
            symbol: request.symbol.clone(),
            side,
            quantity: request.quantity,
            order_type,
            time_in_force,
            price: request.price,
            stop_price: request.stop_price,
            instrument,
            strike_price: request.strike_price,
            expiry_date,
            option_type,
            account,
            clearing_account,
            order_capacity: "A".to_string(),
            min_quantity: request.min_quantity,
            max_show: request.max_show,
            text: request.text.clone(),
            status: OrderStatus::New,
            created_time: now,
            updated_time: now,
            filled_quantity: 0,
            remaining_quantity: request.quantity,
            avg_price: None,
            last_price: None,
            last_quantity: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a fill (partial or full), updating quantities, size-weighted
    /// average price, and status, per spec.md §8 scenario 5.
    pub fn apply_fill(
        &mut self,
        fill_qty: i64,
        fill_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), TerminalOrderError> {
        if self.is_terminal() {
            return Err(TerminalOrderError {
                order_id: self.order_id.clone(),
                status: self.status,
            });
        }

        let prior_filled = self.filled_quantity;
        self.filled_quantity += fill_qty;
        self.remaining_quantity = (self.quantity - self.filled_quantity).max(0);
        self.last_quantity = Some(fill_qty);
        self.last_price = Some(fill_price);

        self.avg_price = Some(match self.avg_price {
            None => fill_price,
            Some(prior_avg) => {
                let prior_value = prior_avg * Decimal::from(prior_filled);
                let fill_value = fill_price * Decimal::from(fill_qty);
                (prior_value + fill_value) / Decimal::from(self.filled_quantity.max(1))
            }
        });

        self.status = if self.remaining_quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_time = now;
        Ok(())
    }

    /// Transition to a new status without a fill (cancel/reject/expire acks).
    pub fn transition_status(
        &mut self,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TerminalOrderError> {
        if self.is_terminal() {
            return Err(TerminalOrderError {
                order_id: self.order_id.clone(),
                status: self.status,
            });
        }
        self.status = status;
        self.updated_time = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_request() -> OrderRequest {
        OrderRequest {
            order_id: "T1".into(),
            symbol: "AAPL".into(),
            side: "BUY".into(),
            quantity: 10,
            price: Some(dec!(25.50)),
            stop_price: None,
            order_type: "LIMIT".into(),
            time_in_force: "DAY".into(),
            account: Some("A1".into()),
            strike_price: None,
            expiry_date: None,
            option_type: None,
            client_order_id: None,
            min_quantity: None,
            max_show: None,
            text: None,
            extra_fields: Default::default(),
        }
    }

    #[test]
    fn new_order_has_full_remaining_quantity() {
        let req = base_request();
        let now = Utc::now();
        let order = ProcessedOrder::new(&req, Side::Buy, OrderType::Limit, TimeInForce::Day, None, None, None, now);
        assert_eq!(order.remaining_quantity, 10);
        assert_eq!(order.filled_quantity, 0);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.clearing_account.as_deref(), Some("A1"));
        assert_eq!(order.order_capacity, "A");
    }

    #[test]
    fn partial_then_full_fill_computes_weighted_avg_price() {
        let req = base_request();
        let now = Utc::now();
        let mut order = ProcessedOrder::new(&req, Side::Buy, OrderType::Limit, TimeInForce::Day, None, None, None, now);

        order.apply_fill(4, dec!(25.00), now).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity, 6);
        assert_eq!(order.avg_price, Some(dec!(25.00)));

        order.apply_fill(6, dec!(26.00), now).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.remaining_quantity, 0);
        // (25.00*4 + 26.00*6) / 10 = 25.60
        assert_eq!(order.avg_price, Some(dec!(25.60)));
    }

    #[test]
    fn terminal_order_rejects_further_fills() {
        let req = base_request();
        let now = Utc::now();
        let mut order = ProcessedOrder::new(&req, Side::Buy, OrderType::Limit, TimeInForce::Day, None, None, None, now);
        order.apply_fill(10, dec!(25.0), now).unwrap();
        assert!(order.is_terminal());
        assert!(order.apply_fill(1, dec!(25.0), now).is_err());
    }

    #[test]
    fn filled_plus_remaining_equals_quantity_invariant() {
        let req = base_request();
        let now = Utc::now();
        let mut order = ProcessedOrder::new(&req, Side::Buy, OrderType::Limit, TimeInForce::Day, None, None, None, now);
        for qty in [3, 3, 4] {
            order.apply_fill(qty, dec!(25.0), now).unwrap();
            assert_eq!(order.filled_quantity + order.remaining_quantity, order.quantity);
        }
    }
}

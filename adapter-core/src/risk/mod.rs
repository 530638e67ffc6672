//! Pre-trade risk engine (spec.md §4.4).
//!
//! All state lives in [`RiskState`], owned by a single [`RiskEngine`]. The
//! whole check-and-record sequence for one order is a single critical
//! section — callers serialize through [`RiskEngine::check_and_record`]
//! rather than calling the individual steps directly.

mod state;

pub use state::{RiskState, RiskStatus};

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::config::RiskLimits;
use crate::error::RiskError;
use crate::model::{OptionType, Side};

/// A single order's worth of information the risk engine needs, independent
/// of [`crate::model::OrderRequest`] so the engine has no dependency on the
/// validator.
pub struct RiskCheckInput<'a> {
    pub symbol: &'a str,
    pub side: Side,
    pub quantity: i64,
    pub option_type: Option<OptionType>,
    pub expiry_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
}

/// Stateful pre-trade risk engine. Cheap to clone (`Arc`-free; wrap in
/// `Arc<RiskEngine>` if shared across tasks) — the mutable state is the
/// single [`Mutex<RiskState>`] field.
pub struct RiskEngine {
    limits: RiskLimits,
    state: Mutex<RiskState>,
}

impl RiskEngine {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(RiskState::default()),
        }
    }

    /// Run spec.md §4.4 steps 1–7 as a single critical section. Returns the
    /// first failing check, or `Ok(())` if the order is admitted and the
    /// state has been updated to reflect it.
    pub fn check_and_record(&self, input: &RiskCheckInput, now: chrono::DateTime<Utc>) -> Result<(), RiskError> {
        if !self.limits.enabled {
            return Ok(());
        }

        let mut state = self.state.lock();
        let today = now.date_naive();

        state.reset_if_new_day(today);

        if input.quantity > self.limits.max_order_size {
            tracing::warn!(symbol = input.symbol, quantity = input.quantity, "order size exceeded");
            return Err(RiskError::OrderSizeExceeded {
                quantity: input.quantity,
                max: self.limits.max_order_size,
            });
        }

        let projected_volume = state.daily_volume(input.symbol) + input.quantity;
        if projected_volume > self.limits.max_daily_volume {
            tracing::warn!(symbol = input.symbol, projected_volume, "daily volume exceeded");
            return Err(RiskError::DailyVolumeExceeded {
                symbol: input.symbol.to_string(),
                projected: projected_volume,
                max: self.limits.max_daily_volume,
            });
        }

        let signed_quantity = match input.side {
            Side::Buy => input.quantity,
            Side::Sell => -input.quantity,
        };
        let projected_position = state.position(input.symbol) + signed_quantity;
        if projected_position.abs() > self.limits.max_position_size {
            tracing::warn!(symbol = input.symbol, projected_position, "position limit exceeded");
            return Err(RiskError::PositionLimitExceeded {
                symbol: input.symbol.to_string(),
                projected: projected_position,
                max: self.limits.max_position_size,
            });
        }

        let recent_count = state.recent_order_count(input.symbol, now);
        if recent_count >= self.limits.max_orders_per_second {
            tracing::warn!(symbol = input.symbol, recent_count, "order rate exceeded");
            return Err(RiskError::RateLimitExceeded {
                symbol: input.symbol.to_string(),
                count: recent_count,
                max: self.limits.max_orders_per_second,
            });
        }

        if let Some(expiry_date) = input.expiry_date {
            let days_to_expiry = (expiry_date - today).num_days();
            if expiry_date <= today || days_to_expiry < 1 {
                tracing::warn!(symbol = input.symbol, %expiry_date, "option expiry too soon");
                return Err(RiskError::OptionExpiryTooSoon {
                    symbol: input.symbol.to_string(),
                    expiry_date,
                    today,
                });
            }
            if let Some(price) = input.price {
                if price < self.limits.min_option_price {
                    tracing::warn!(symbol = input.symbol, %price, "option price below typical minimum (warn-only)");
                }
            }
        }

        state.record(input.symbol, input.quantity, now);
        Ok(())
    }

    /// Update `position[symbol]` from a fill's `last_qty` (spec.md §4.8:
    /// applied once per fill, not from `cum_qty`, so repeated partial fills
    /// don't double-count).
    pub fn apply_fill(&self, symbol: &str, side: Side, last_qty: i64) {
        let mut state = self.state.lock();
        let delta = match side {
            Side::Buy => last_qty,
            Side::Sell => -last_qty,
        };
        state.adjust_position(symbol, delta);
    }

    /// Read-only snapshot for observability (spec.md §4.4 AMBIENT).
    pub fn status(&self) -> RiskStatus {
        self.state.lock().snapshot()
    }

    /// Seed a non-default starting state. Used by tests that need to
    /// exercise steps 2-6 against existing volume/position/order-rate
    /// history rather than an empty engine.
    #[cfg(test)]
    fn with_state(limits: RiskLimits, state: RiskState) -> Self {
        Self {
            limits,
            state: Mutex::new(state),
        }
    }
}

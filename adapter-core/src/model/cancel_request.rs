//! Outbound cancel and cancel/replace requests (spec.md §3 SUPPLEMENT, grounded
//! on the original service's `OrderCancelRequest`/`OrderReplaceRequest`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderType, Side, TimeInForce};

/// Request to cancel a live order. `orig_client_order_id` must name the
/// client order id the order was last acknowledged under, per FIX
/// OrigClOrdID (tag 41) semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelRequest {
    pub order_id: String,
    pub client_order_id: String,
    pub orig_client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub account: Option<String>,
    pub text: Option<String>,
    pub cancel_request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Request to replace the size and/or price of a live order
/// (OrderCancelReplaceRequest, tag 35=G).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReplaceRequest {
    pub order_id: String,
    pub client_order_id: String,
    pub orig_client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub account: Option<String>,
    pub text: Option<String>,
    pub replace_request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderCancelRequest {
    pub fn new(
        order_id: impl Into<String>,
        client_order_id: impl Into<String>,
        orig_client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            client_order_id: client_order_id.into(),
            orig_client_order_id: orig_client_order_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            account: None,
            text: None,
            cancel_request_id: format!("CXL_{}", now.format("%Y%m%d%H%M%S%3f")),
            timestamp: now,
        }
    }
}

impl OrderReplaceRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: impl Into<String>,
        client_order_id: impl Into<String>,
        orig_client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: i64,
        price: Option<Decimal>,
        order_type: OrderType,
        time_in_force: TimeInForce,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            client_order_id: client_order_id.into(),
            orig_client_order_id: orig_client_order_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            price,
            order_type,
            time_in_force,
            account: None,
            text: None,
            replace_request_id: format!("REP_{}", now.format("%Y%m%d%H%M%S%3f")),
            timestamp: now,
        }
    }
}

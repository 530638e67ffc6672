//! Inbound FIX execution reports (tag 35=8) and cancel rejects (tag 35=9).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Execution type, FIX tag 150.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecType {
    New,
    PartialFill,
    Fill,
    Canceled,
    Replaced,
    PendingCancel,
    PendingReplace,
    Rejected,
    Expired,
}

/// Order status, FIX tag 39, as reported by the counterparty. Distinct from
/// [`super::OrderStatus`] — this is the venue's view, translated onto our
/// `ProcessedOrder` by [`crate::gateway::Gateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrdStatus {
    New,
    PartiallyFilled,
    Filled,
    DoneForDay,
    Canceled,
    PendingCancel,
    Rejected,
    PendingNew,
    Expired,
    PendingReplace,
}

/// A decoded ExecutionReport (tag 35=8), spec.md §3.
///
/// Carries the venue's running invariant `cum_qty + leaves_qty == order_qty`;
/// [`crate::gateway::Gateway`] treats a violation as a protocol error rather
/// than attempting to reconcile it silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: String,
    pub client_order_id: String,
    pub orig_client_order_id: Option<String>,
    pub exec_id: String,
    pub exec_type: ExecType,
    pub ord_status: OrdStatus,
    pub symbol: String,
    pub side: Side,

    pub order_qty: i64,
    pub cum_qty: i64,
    pub leaves_qty: i64,
    pub last_qty: Option<i64>,
    pub last_price: Option<Decimal>,
    pub avg_price: Option<Decimal>,

    pub transact_time: DateTime<Utc>,
    pub account: Option<String>,
    pub text: Option<String>,
}

impl ExecutionReport {
    /// `cum_qty + leaves_qty == order_qty` (spec.md §3 ExecutionReport invariant).
    pub fn quantities_reconcile(&self) -> bool {
        self.cum_qty + self.leaves_qty == self.order_qty
    }
}

/// A decoded OrderCancelReject (tag 35=9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelReject {
    pub order_id: String,
    pub client_order_id: String,
    pub orig_client_order_id: String,
    pub ord_status: OrdStatus,
    pub cxl_rej_response_to: CancelRejectResponseTo,
    pub cxl_rej_reason: Option<i32>,
    pub text: Option<String>,
}

/// FIX tag 434, identifies whether the rejected request was a cancel or a
/// cancel/replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelRejectResponseTo {
    OrderCancelRequest,
    OrderCancelReplaceRequest,
}

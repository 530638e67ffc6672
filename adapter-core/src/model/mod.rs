//! The value model: immutable ingress requests, the canonical processed
//! order, resolved option instruments, and inbound execution reports.

mod cancel_request;
mod enums;
mod execution_report;
mod instrument;
mod order_request;
mod processed_order;

pub use cancel_request::{OrderCancelRequest, OrderReplaceRequest};
pub use enums::{OptionType, OrderStatus, OrderType, Side, TimeInForce};
pub use execution_report::{CancelRejectResponseTo, ExecType, ExecutionReport, OrdStatus, OrderCancelReject};
pub use instrument::Instrument;
pub use order_request::OrderRequest;
pub use processed_order::{ProcessedOrder, TerminalOrderError};

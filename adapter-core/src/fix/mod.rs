//! FIX 4.4 wire codec and session state machine (spec.md §4.5, §4.6).

pub mod decode;
pub mod encode;
pub mod session;
pub mod store;
pub mod types;

pub use decode::{decode_execution_report, decode_order_cancel_reject, parse, DecodedMessage};
pub use encode::{encode_new_order_single, encode_order_cancel_replace_request, encode_order_cancel_request, wrap, SessionHeader};
pub use session::{Session, SessionAction};
pub use store::{FileSequenceStore, MemorySequenceStore, SequenceStore};
pub use types::{tags, FixFieldMap, MsgType, SessionState, BEGIN_STRING, SOH};

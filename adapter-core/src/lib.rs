//! Core of a FIX 4.4 order adapter bridging an internal order-injection
//! transport to a broker's order-entry session.
//!
//! ## Modules
//! - [`model`]: the value model — ingress `OrderRequest`, the canonical
//!   `ProcessedOrder`, resolved option `Instrument`s, inbound `ExecutionReport`s.
//! - [`config`]: typed settings, no file I/O.
//! - [`validator`]: ingress field-format and range rules.
//! - [`instrument`]: resolves option symbols into `Instrument`s.
//! - [`risk`]: the pre-trade risk engine.
//! - [`fix`]: the FIX 4.4 wire codec and session state machine.
//! - [`processor`]: wires validator → instrument → risk into one pipeline.
//! - [`gateway`]: bridges the processor's output to the FIX session.
//! - [`error`]: the error taxonomy shared by every component.
//! - [`utils`]: logging setup.

pub mod config;
pub mod error;
pub mod fix;
pub mod gateway;
pub mod ingress;
pub mod instrument;
pub mod model;
pub mod processor;
pub mod risk;
pub mod utils;
pub mod validator;

pub use anyhow::{Error, Result};

pub use config::AdapterConfig;
pub use error::{CodecError, ConnectionError, InstrumentError, ProcessingError, RiskError, SessionError, ValidationError};
pub use gateway::Gateway;
pub use ingress::{IngressListener, PipelineError};
pub use processor::OrderProcessor;

/// Convenient imports for a binary embedding this core.
pub mod prelude {
    pub use crate::config::AdapterConfig;
    pub use crate::error::{CodecError, ConnectionError, InstrumentError, ProcessingError, RiskError, SessionError, ValidationError};
    pub use crate::fix::{FixFieldMap, MsgType, Session, SessionAction, SessionState};
    pub use crate::gateway::Gateway;
    pub use crate::ingress::{IngressListener, PipelineError};
    pub use crate::model::{OrderRequest, ProcessedOrder};
    pub use crate::processor::OrderProcessor;
    pub use crate::risk::RiskEngine;
    pub use crate::{Error, Result};
}

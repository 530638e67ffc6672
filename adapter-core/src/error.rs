//! The error taxonomy of this core, one `thiserror` enum per component
//! (spec.md §7). Every variant is logged at its origin before being returned
//! (see call sites in `validator`, `risk`, `fix::session`, `gateway`).

use thiserror::Error;

/// Failure from the [`crate::validator`]: the ingress payload fails one of
/// the ordered rules in spec.md §4.1. The variant names the first rule that
/// failed — callers never see more than one reason per rejection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("order_id '{0}' does not match ^[A-Za-z0-9_-]{{1,50}}$")]
    InvalidOrderIdFormat(String),

    #[error("symbol '{0}' does not match ^[A-Z]{{1,12}}$")]
    InvalidSymbolFormat(String),

    #[error("account '{0}' does not match ^[A-Za-z0-9_-]{{1,20}}$")]
    InvalidAccountFormat(String),

    #[error("unknown side '{0}'")]
    InvalidSide(String),

    #[error("unknown order_type '{0}'")]
    InvalidOrderType(String),

    #[error("unknown time_in_force '{0}'")]
    InvalidTimeInForce(String),

    #[error("unknown option_type '{0}'")]
    InvalidOptionType(String),

    #[error("quantity {0} out of range [1, 1000000]")]
    QuantityOutOfRange(i64),

    #[error("{order_type} requires a price")]
    MissingPrice { order_type: String },

    #[error("{order_type} requires a stop_price")]
    MissingStopPrice { order_type: String },

    #[error("price {0} out of range [0.01, 999999.99] or has more than 4 decimal places")]
    InvalidPriceRange(rust_decimal::Decimal),

    #[error("expiry_date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidExpiryFormat(String),

    #[error("expiry_date {0} is not strictly after today")]
    ExpiryNotInFuture(chrono::NaiveDate),

    #[error("min_quantity {min_quantity} must be in (0, {quantity}]")]
    InvalidMinQuantity { min_quantity: i64, quantity: i64 },

    #[error("max_show {max_show} must be in (0, {quantity}]")]
    InvalidMaxShow { max_show: i64, quantity: i64 },

    #[error("symbol {symbol} requires strike_price, expiry_date, and option_type")]
    MissingOptionFields { symbol: String },
}

/// Failure from the [`crate::instrument`] resolver (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("option {symbol} expired on {expiry_date} (today is {today})")]
    Expired {
        symbol: String,
        expiry_date: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },

    #[error("cannot resolve instrument for {symbol}: {reason}")]
    Unresolvable { symbol: String, reason: String },
}

/// Failure from the [`crate::risk`] engine (spec.md §4.4), carrying a
/// sub-reason code per spec.md §7.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("order size {quantity} exceeds max_order_size {max}")]
    OrderSizeExceeded { quantity: i64, max: i64 },

    #[error("daily volume for {symbol} would reach {projected}, exceeding max_daily_volume {max}")]
    DailyVolumeExceeded {
        symbol: String,
        projected: i64,
        max: i64,
    },

    #[error("projected position for {symbol} would reach {projected}, exceeding max_position_size {max}")]
    PositionLimitExceeded {
        symbol: String,
        projected: i64,
        max: i64,
    },

    #[error("order rate for {symbol} exceeded: {count} orders in the last second, limit {max}")]
    RateLimitExceeded {
        symbol: String,
        count: usize,
        max: usize,
    },

    #[error("option {symbol} expiring {expiry_date} fails the minimum-time-to-expiry check (today {today})")]
    OptionExpiryTooSoon {
        symbol: String,
        expiry_date: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },
}

/// Catch-all for internal failures during pipeline composition (spec.md §7).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("internal processing failure: {0}")]
    Internal(String),
}

/// Failure decoding or encoding a FIX message (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("message has no SOH-delimited fields")]
    Empty,

    #[error("field '{0}' is missing a '=' separator")]
    MalformedField(String),

    #[error("tag '{0}' is not a valid integer")]
    InvalidTag(String),

    #[error("missing required tag {0}")]
    MissingTag(u32),

    #[error("BeginString '{0}' is not FIX.4.4")]
    UnsupportedBeginString(String),

    #[error("BodyLength {declared} does not match measured length {measured}")]
    BodyLengthMismatch { declared: usize, measured: usize },

    #[error("checksum {declared:03} does not match computed checksum {computed:03}")]
    ChecksumMismatch { declared: u8, computed: u8 },

    #[error("unsupported MsgType '{0}'")]
    UnsupportedMsgType(String),

    #[error("malformed value for tag {tag}: {value}")]
    InvalidFieldValue { tag: u32, value: String },
}

/// Failure in the session state machine (spec.md §4.6); forces a reconnect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("received sequence {received} is below expected {expected} without PossDupFlag")]
    SequenceTooLow { received: u64, expected: u64 },

    #[error("logon timed out after {0}s")]
    LogonTimeout(u64),

    #[error("counterparty rejected logon: {0}")]
    LogonRejected(String),

    #[error("heartbeat silence exceeded tolerance; forcing disconnect")]
    HeartbeatTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Raised when the Gateway is asked to send while the session is not ACTIVE
/// (spec.md §4.8).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("session is {state:?}, not ACTIVE; cannot send order {client_order_id}")]
    NotActive {
        state: crate::fix::SessionState,
        client_order_id: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

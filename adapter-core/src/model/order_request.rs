//! Ingress order request — externally supplied, immutable once constructed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw order request as decoded from the ingress transport (spec.md §3).
///
/// Fields are kept as loosely-typed strings/decimals here; [`crate::validator`]
/// is the single place that interprets and rejects them. `OrderRequest` itself
/// performs no validation — constructing one from untrusted JSON is always
/// possible, checking it is the validator's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    pub order_type: String,
    pub time_in_force: String,
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub strike_price: Option<Decimal>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub option_type: Option<String>,

    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub min_quantity: Option<i64>,
    #[serde(default)]
    pub max_show: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,

    /// Fields present in the payload but unrecognized by this core; preserved
    /// and ignored, per spec.md §6 ("Fields not recognized are preserved in
    /// an `extra_fields` bag").
    #[serde(default, flatten)]
    pub extra_fields: HashMap<String, serde_json::Value>,
}

impl OrderRequest {
    /// Client order id to correlate acks/fills against, defaulting to `order_id`
    /// when the sender omitted it (spec.md §3).
    pub fn effective_client_order_id(&self) -> &str {
        self.client_order_id.as_deref().unwrap_or(&self.order_id)
    }
}

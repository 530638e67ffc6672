use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Top-level settings consumed by every component. Construction (from a file,
/// environment, or a literal) is left to the caller; this core only reads the
/// typed struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub ingress: IngressConfig,
    #[serde(default)]
    pub fix: FixSessionConfig,
    #[serde(default)]
    pub risk: RiskLimits,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            ingress: IngressConfig::default(),
            fix: FixSessionConfig::default(),
            risk: RiskLimits::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Ingress listener settings (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_address: String,

    /// Bounded receive high-water mark; excess frames are discarded with no ack.
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,

    /// Symbols treated as option symbols by the Instrument Resolver
    /// (spec.md §4.2: "SPXW or any configured option symbol").
    #[serde(default = "default_option_symbols")]
    pub option_symbols: HashSet<String>,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_addr(),
            high_water_mark: default_high_water_mark(),
            option_symbols: default_option_symbols(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:5555".to_string()
}

fn default_high_water_mark() -> usize {
    1000
}

fn default_option_symbols() -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert("SPXW".to_string());
    set
}

/// FIX session settings (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixSessionConfig {
    #[serde(default = "default_sender_comp_id")]
    pub sender_comp_id: String,
    #[serde(default = "default_target_comp_id")]
    pub target_comp_id: String,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_secs: u64,
    #[serde(default = "default_logon_timeout")]
    pub logon_timeout_secs: u64,
}

impl Default for FixSessionConfig {
    fn default() -> Self {
        Self {
            sender_comp_id: default_sender_comp_id(),
            target_comp_id: default_target_comp_id(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            reconnect_interval_secs: default_reconnect_interval(),
            logon_timeout_secs: default_logon_timeout(),
        }
    }
}

fn default_sender_comp_id() -> String {
    "ADAPTER".to_string()
}

fn default_target_comp_id() -> String {
    "BROKER".to_string()
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_reconnect_interval() -> u64 {
    60
}

fn default_logon_timeout() -> u64 {
    30
}

/// Pre-trade risk limits (spec.md §4.4), defaults taken from the source
/// adapter's `RiskLimits` dataclass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    #[serde(default = "default_max_order_size")]
    pub max_order_size: i64,
    #[serde(default = "default_max_daily_volume")]
    pub max_daily_volume: i64,
    #[serde(default = "default_max_orders_per_second")]
    pub max_orders_per_second: usize,
    #[serde(default = "default_max_position_size")]
    pub max_position_size: i64,
    #[serde(default = "default_min_option_price")]
    pub min_option_price: Decimal,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: default_max_order_size(),
            max_daily_volume: default_max_daily_volume(),
            max_orders_per_second: default_max_orders_per_second(),
            max_position_size: default_max_position_size(),
            min_option_price: default_min_option_price(),
            enabled: true,
        }
    }
}

fn default_max_order_size() -> i64 {
    1000
}

fn default_max_daily_volume() -> i64 {
    10_000
}

fn default_max_orders_per_second() -> usize {
    10
}

fn default_max_position_size() -> i64 {
    5000
}

fn default_min_option_price() -> Decimal {
    dec!(0.05)
}

fn default_true() -> bool {
    true
}

/// Logging/observability settings. No metrics-export endpoint lives here —
/// wiring one up is external to this core (spec.md §1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

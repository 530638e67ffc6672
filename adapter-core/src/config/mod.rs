//! Configuration types.
//!
//! `AdapterConfig` is a plain `serde::Deserialize` struct with a `Default`
//! impl carrying the same defaults as the system it bridges to. Parsing a
//! config file, watching it for changes, and wiring an environment-variable
//! overlay are all left to the binary that embeds this core — nothing here
//! touches the filesystem.

pub mod types;

pub use types::{AdapterConfig, FixSessionConfig, IngressConfig, ObservabilityConfig, RiskLimits};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_spxw_as_an_option_symbol() {
        let config = AdapterConfig::default();
        assert!(config.ingress.option_symbols.contains("SPXW"));
    }

    #[test]
    fn default_risk_limits_match_documented_defaults() {
        let risk = RiskLimits::default();
        assert_eq!(risk.max_order_size, 1000);
        assert_eq!(risk.max_daily_volume, 10_000);
        assert_eq!(risk.max_orders_per_second, 10);
        assert_eq!(risk.max_position_size, 5000);
        assert!(risk.enabled);
    }

    #[test]
    fn deserializes_from_partial_json() {
        let raw = r#"{ "risk": { "max_order_size": 50 } }"#;
        let config: AdapterConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.risk.max_order_size, 50);
        assert_eq!(config.risk.max_daily_volume, 10_000);
        assert_eq!(config.fix.heartbeat_interval_secs, 30);
    }
}

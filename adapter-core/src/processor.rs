//! Order processing pipeline (spec.md §4.3): validate → resolve instrument →
//! construct → risk-check → enrich. Every stage's typed error composes into
//! [`ProcessingError`] so callers get exactly one reason per rejection.

use std::sync::Arc;

use chrono::Utc;

use crate::config::RiskLimits;
use crate::error::ProcessingError;
use crate::instrument::InstrumentResolver;
use crate::model::{OrderRequest, ProcessedOrder};
use crate::risk::{RiskCheckInput, RiskEngine};
use crate::validator;

/// Per-category counters the processor maintains across the life of the
/// process (SPEC_FULL §4.3 AMBIENT — surfaced for observability, consulted
/// by nothing internally).
#[derive(Debug, Default)]
pub struct ProcessorStats {
    pub accepted: std::sync::atomic::AtomicU64,
    pub validation_rejected: std::sync::atomic::AtomicU64,
    pub instrument_rejected: std::sync::atomic::AtomicU64,
    pub risk_rejected: std::sync::atomic::AtomicU64,
}

impl ProcessorStats {
    fn bump(counter: &std::sync::atomic::AtomicU64) {
        counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Owns the validator's option-symbol configuration, the instrument
/// resolver, and the risk engine; exposes a single `process` entry point.
pub struct OrderProcessor {
    option_symbols: Vec<String>,
    instrument_resolver: InstrumentResolver,
    risk_engine: Arc<RiskEngine>,
    stats: ProcessorStats,
}

impl OrderProcessor {
    pub fn new(option_symbols: impl IntoIterator<Item = String>, risk_limits: RiskLimits) -> Self {
        let option_symbols: Vec<String> = option_symbols.into_iter().collect();
        Self {
            instrument_resolver: InstrumentResolver::new(option_symbols.clone()),
            option_symbols,
            risk_engine: Arc::new(RiskEngine::new(risk_limits)),
            stats: ProcessorStats::default(),
        }
    }

    /// Clones the `Arc`, not the engine: the processor and every [`crate::gateway::Gateway`]
    /// built from it share one risk engine and its position/volume state.
    pub fn risk_engine(&self) -> Arc<RiskEngine> {
        self.risk_engine.clone()
    }

    pub fn stats(&self) -> &ProcessorStats {
        &self.stats
    }

    /// Run the full pipeline for one ingress request, returning a fully
    /// enriched [`ProcessedOrder`] ready for the Gateway, or the first
    /// failing stage's error.
    pub fn process(&self, request: &OrderRequest) -> Result<ProcessedOrder, ProcessingError> {
        let now = Utc::now();
        let today = now.date_naive();

        let option_symbol_refs: Vec<&str> = self.option_symbols.iter().map(String::as_str).collect();
        let validated = validator::validate(request, &option_symbol_refs, today).map_err(|e| {
            ProcessorStats::bump(&self.stats.validation_rejected);
            ProcessingError::Validation(e)
        })?;

        let instrument = self
            .instrument_resolver
            .resolve(request, validated.option_type, validated.expiry_date, today)
            .map_err(|e| {
                ProcessorStats::bump(&self.stats.instrument_rejected);
                ProcessingError::Instrument(e)
            })?;

        let risk_input = RiskCheckInput {
            symbol: &request.symbol,
            side: validated.side,
            quantity: request.quantity,
            option_type: validated.option_type,
            expiry_date: validated.expiry_date,
            price: request.price,
        };
        self.risk_engine.check_and_record(&risk_input, now).map_err(|e| {
            ProcessorStats::bump(&self.stats.risk_rejected);
            ProcessingError::Risk(e)
        })?;

        let processed = ProcessedOrder::new(
            request,
            validated.side,
            validated.order_type,
            validated.time_in_force,
            validated.option_type,
            instrument,
            validated.expiry_date,
            now,
        );

        ProcessorStats::bump(&self.stats.accepted);
        Ok(processed)
    }
}

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Mutable, process-local risk accounting (spec.md §3 RiskState). Reset
/// semantics live in [`RiskState::reset_if_new_day`] — positions are
/// deliberately excluded from the daily reset (spec.md §4.4 step 1).
#[derive(Debug, Clone, Default)]
pub struct RiskState {
    daily_volume: HashMap<String, i64>,
    daily_order_count: HashMap<String, i64>,
    position: HashMap<String, i64>,
    recent_orders: HashMap<String, Vec<DateTime<Utc>>>,
    last_reset_date: Option<NaiveDate>,
}

const RECENT_ORDER_WINDOW_SECS: i64 = 1;
const RECENT_ORDER_PRUNE_SECS: i64 = 300;

impl RiskState {
    pub fn daily_volume(&self, symbol: &str) -> i64 {
        *self.daily_volume.get(symbol).unwrap_or(&0)
    }

    pub fn daily_order_count(&self, symbol: &str) -> i64 {
        *self.daily_order_count.get(symbol).unwrap_or(&0)
    }

    pub fn position(&self, symbol: &str) -> i64 {
        *self.position.get(symbol).unwrap_or(&0)
    }

    pub fn recent_order_count(&self, symbol: &str, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::seconds(RECENT_ORDER_WINDOW_SECS);
        self.recent_orders
            .get(symbol)
            .map(|timestamps| timestamps.iter().filter(|&&t| t > cutoff).count())
            .unwrap_or(0)
    }

    /// Clear daily counters (not positions) if `today` differs from the last
    /// observed reset date.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) {
        if self.last_reset_date != Some(today) {
            self.daily_volume.clear();
            self.daily_order_count.clear();
            self.last_reset_date = Some(today);
        }
    }

    /// Step 7 of spec.md §4.4: append the order timestamp, bump daily
    /// counters, prune the rate-limit window.
    pub fn record(&mut self, symbol: &str, quantity: i64, now: DateTime<Utc>) {
        *self.daily_volume.entry(symbol.to_string()).or_insert(0) += quantity;
        *self.daily_order_count.entry(symbol.to_string()).or_insert(0) += 1;

        let timestamps = self.recent_orders.entry(symbol.to_string()).or_default();
        timestamps.push(now);
        let prune_cutoff = now - chrono::Duration::seconds(RECENT_ORDER_PRUNE_SECS);
        timestamps.retain(|&t| t > prune_cutoff);
    }

    /// Applied by the Gateway on fills, using `last_qty` (spec.md §4.8).
    pub fn adjust_position(&mut self, symbol: &str, delta: i64) {
        *self.position.entry(symbol.to_string()).or_insert(0) += delta;
    }

    pub fn snapshot(&self) -> RiskStatus {
        RiskStatus {
            daily_volume: self.daily_volume.clone(),
            daily_order_count: self.daily_order_count.clone(),
            position: self.position.clone(),
            last_reset_date: self.last_reset_date,
        }
    }
}

/// Read-only snapshot of [`RiskState`] for observability (SPEC_FULL §4.4
/// AMBIENT); has no effect on any check.
#[derive(Debug, Clone)]
pub struct RiskStatus {
    daily_volume: HashMap<String, i64>,
    daily_order_count: HashMap<String, i64>,
    position: HashMap<String, i64>,
    last_reset_date: Option<NaiveDate>,
}

impl RiskStatus {
    pub fn daily_volume(&self, symbol: &str) -> i64 {
        *self.daily_volume.get(symbol).unwrap_or(&0)
    }

    pub fn daily_order_count(&self, symbol: &str) -> i64 {
        *self.daily_order_count.get(symbol).unwrap_or(&0)
    }

    pub fn position(&self, symbol: &str) -> i64 {
        *self.position.get(symbol).unwrap_or(&0)
    }

    pub fn last_reset_date(&self) -> Option<NaiveDate> {
        self.last_reset_date
    }
}

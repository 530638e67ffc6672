//! Resolved instrument record for option symbols (spec.md §3 Instrument).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fully specified option instrument, produced by
/// [`crate::instrument::InstrumentResolver`].
///
/// `security_id` is a pure function of `(symbol, expiry_date, option_type,
/// strike_price)` — see [`Instrument::security_id`] — so two resolutions of
/// the same option always agree, independent of when they run (spec.md §8
/// universal property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub underlying_symbol: String,
    pub strike_price: Decimal,
    pub expiry_date: NaiveDate,
    pub option_type: super::OptionType,
    pub exchange: String,
    pub currency: String,
    pub contract_size: i64,
    pub security_id: String,
    pub security_id_source: String,

    /// Minimum price increment; defaults to 0.05 for SPXW-style weeklies
    /// (`original_source/src/models/spxw_instruments.py::SPXWInstrument.tick_size`).
    pub tick_size: Decimal,
}

impl Instrument {
    /// Deterministic security identifier encoding (spec.md §3):
    /// `{symbol}_{YY}{MM}{DD}_{C|P}_{strike*1000, zero-padded to 8 digits}`.
    pub fn compute_security_id(
        symbol: &str,
        expiry_date: NaiveDate,
        option_type: super::OptionType,
        strike_price: Decimal,
    ) -> String {
        let yy = expiry_date.format("%y%m%d");
        let cp = match option_type {
            super::OptionType::Call => "C",
            super::OptionType::Put => "P",
        };
        // Truncates rather than rounds, matching the original system's
        // `int(strike_price * 1000)` encoding.
        let strike_thousandths = (strike_price * Decimal::from(1000))
            .trunc()
            .to_string()
            .parse::<i64>()
            .unwrap_or(0);
        format!("{symbol}_{yy}_{cp}_{strike_thousandths:08}")
    }

    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.expiry_date
    }

    pub fn maturity_date_fix(&self) -> String {
        self.expiry_date.format("%Y%m%d").to_string()
    }

    pub fn put_or_call_fix(&self) -> u8 {
        match self.option_type {
            super::OptionType::Call => 1,
            super::OptionType::Put => 0,
        }
    }

    /// Moneyness relative to a caller-supplied underlying price; this core
    /// has no market-data feed of its own (Non-goal), so the spot price is
    /// always the caller's to provide.
    pub fn is_itm(&self, underlying_price: Decimal) -> bool {
        match self.option_type {
            super::OptionType::Call => underlying_price > self.strike_price,
            super::OptionType::Put => underlying_price < self.strike_price,
        }
    }

    pub fn is_otm(&self, underlying_price: Decimal) -> bool {
        !self.is_itm(underlying_price) && !self.is_atm(underlying_price)
    }

    pub fn is_atm(&self, underlying_price: Decimal) -> bool {
        underlying_price == self.strike_price
    }
}

//! Turns a validated order request into a fully specified [`Instrument`]
//! (spec.md §4.2).

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::error::InstrumentError;
use crate::model::{Instrument, OptionType, OrderRequest};

/// Resolves option instruments for a configured set of option symbols.
/// Non-option symbols pass through with `None` — this resolver has nothing
/// to do for them.
pub struct InstrumentResolver {
    option_symbols: Vec<String>,
}

impl InstrumentResolver {
    pub fn new(option_symbols: impl IntoIterator<Item = String>) -> Self {
        Self {
            option_symbols: option_symbols.into_iter().collect(),
        }
    }

    fn is_option_symbol(&self, symbol: &str) -> bool {
        self.option_symbols.iter().any(|s| s == symbol)
    }

    /// Resolve the instrument for `request`, given its already-validated
    /// option fields. Returns `Ok(None)` for non-option symbols.
    pub fn resolve(
        &self,
        request: &OrderRequest,
        option_type: Option<OptionType>,
        expiry_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Option<Instrument>, InstrumentError> {
        if !self.is_option_symbol(&request.symbol) {
            return Ok(None);
        }

        let (strike_price, expiry_date, option_type) = match (request.strike_price, expiry_date, option_type) {
            (Some(strike), Some(expiry), Some(opt)) => (strike, expiry, opt),
            _ => {
                return Err(InstrumentError::Unresolvable {
                    symbol: request.symbol.clone(),
                    reason: "missing strike_price, expiry_date, or option_type".to_string(),
                })
            }
        };

        // Defensive check: the validator already rejects expired options,
        // but the resolver does not trust that invariant blindly.
        if expiry_date <= today {
            return Err(InstrumentError::Expired {
                symbol: request.symbol.clone(),
                expiry_date,
                today,
            });
        }

        let security_id = Instrument::compute_security_id(&request.symbol, expiry_date, option_type, strike_price);

        Ok(Some(Instrument {
            symbol: request.symbol.clone(),
            underlying_symbol: underlying_for(&request.symbol),
            strike_price,
            expiry_date,
            option_type,
            exchange: "CBOE".to_string(),
            currency: "USD".to_string(),
            contract_size: 100,
            security_id,
            security_id_source: "8".to_string(),
            tick_size: dec!(0.05),
        }))
    }
}

fn underlying_for(symbol: &str) -> String {
    match symbol {
        "SPXW" => "SPX".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spxw_request(expiry: &str) -> OrderRequest {
        OrderRequest {
            order_id: "T1".into(),
            symbol: "SPXW".into(),
            side: "BUY".into(),
            quantity: 10,
            price: Some(dec!(25.50)),
            stop_price: None,
            order_type: "LIMIT".into(),
            time_in_force: "DAY".into(),
            account: None,
            strike_price: Some(dec!(4150)),
            expiry_date: Some(expiry.to_string()),
            option_type: Some("CALL".into()),
            client_order_id: None,
            min_quantity: None,
            max_show: None,
            text: None,
            extra_fields: Default::default(),
        }
    }

    #[test]
    fn non_option_symbol_resolves_to_none() {
        let resolver = InstrumentResolver::new(["SPXW".to_string()]);
        let mut req = spxw_request("2026-08-21");
        req.symbol = "AAPL".into();
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert_eq!(resolver.resolve(&req, None, None, today).unwrap(), None);
    }

    #[test]
    fn resolves_spxw_with_deterministic_security_id() {
        let resolver = InstrumentResolver::new(["SPXW".to_string()]);
        let req = spxw_request("2026-08-21");
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 8, 21).unwrap();
        let instrument = resolver
            .resolve(&req, Some(OptionType::Call), Some(expiry), today)
            .unwrap()
            .unwrap();
        assert_eq!(instrument.underlying_symbol, "SPX");
        assert_eq!(instrument.security_id, "SPXW_260821_C_04150000");
    }

    #[test]
    fn rejects_already_expired_option_defensively() {
        let resolver = InstrumentResolver::new(["SPXW".to_string()]);
        let req = spxw_request("2020-01-01");
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let result = resolver.resolve(&req, Some(OptionType::Call), Some(expiry), today);
        assert!(matches!(result, Err(InstrumentError::Expired { .. })));
    }

    #[test]
    fn missing_option_fields_is_unresolvable() {
        let resolver = InstrumentResolver::new(["SPXW".to_string()]);
        let mut req = spxw_request("2026-08-21");
        req.strike_price = None;
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 8, 21).unwrap();
        let result = resolver.resolve(&req, Some(OptionType::Call), Some(expiry), today);
        assert!(matches!(result, Err(InstrumentError::Unresolvable { .. })));
    }
}

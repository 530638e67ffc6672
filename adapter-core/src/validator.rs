//! Pure predicates over ingress [`OrderRequest`]s (spec.md §4.1).
//!
//! Every rule is checked in the order spec.md's table lists them; the first
//! failure short-circuits the rest. No I/O, no clock reads beyond comparing
//! against `today` passed in by the caller.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValidationError;
use crate::model::{OptionType, OrderRequest, OrderType, Side, TimeInForce};

fn order_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,50}$").unwrap())
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{1,12}$").unwrap())
}

fn account_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,20}$").unwrap())
}

const MIN_QUANTITY: i64 = 1;
const MAX_QUANTITY: i64 = 1_000_000;

fn min_price() -> Decimal {
    dec!(0.01)
}

fn max_price() -> Decimal {
    dec!(999999.99)
}

/// The fields of an [`OrderRequest`] parsed into their typed form, returned
/// alongside a successful validation so the processor doesn't re-parse them.
#[derive(Debug, Clone)]
pub struct ValidatedFields {
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub option_type: Option<OptionType>,
    pub expiry_date: Option<NaiveDate>,
}

/// Validate a raw [`OrderRequest`], returning its fields parsed into typed
/// form on success, or the first failing rule on failure.
pub fn validate(request: &OrderRequest, option_symbols: &[&str], today: NaiveDate) -> Result<ValidatedFields, ValidationError> {
    if request.order_id.is_empty() {
        return Err(ValidationError::MissingField("order_id"));
    }
    if request.symbol.is_empty() {
        return Err(ValidationError::MissingField("symbol"));
    }
    if request.side.is_empty() {
        return Err(ValidationError::MissingField("side"));
    }
    if request.order_type.is_empty() {
        return Err(ValidationError::MissingField("order_type"));
    }
    if request.time_in_force.is_empty() {
        return Err(ValidationError::MissingField("time_in_force"));
    }

    if !order_id_re().is_match(&request.order_id) {
        return Err(ValidationError::InvalidOrderIdFormat(request.order_id.clone()));
    }
    if !symbol_re().is_match(&request.symbol) {
        return Err(ValidationError::InvalidSymbolFormat(request.symbol.clone()));
    }
    if let Some(account) = &request.account {
        if !account_re().is_match(account) {
            return Err(ValidationError::InvalidAccountFormat(account.clone()));
        }
    }

    let side = Side::from_str(&request.side).map_err(|_| ValidationError::InvalidSide(request.side.clone()))?;
    let order_type = OrderType::from_str(&request.order_type)
        .map_err(|_| ValidationError::InvalidOrderType(request.order_type.clone()))?;
    let time_in_force = TimeInForce::from_str(&request.time_in_force)
        .map_err(|_| ValidationError::InvalidTimeInForce(request.time_in_force.clone()))?;
    let option_type = match &request.option_type {
        Some(raw) => Some(
            OptionType::from_str(raw).map_err(|_| ValidationError::InvalidOptionType(raw.clone()))?,
        ),
        None => None,
    };

    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&request.quantity) {
        return Err(ValidationError::QuantityOutOfRange(request.quantity));
    }

    let needs_price = matches!(order_type, OrderType::Limit | OrderType::StopLimit);
    let needs_stop_price = matches!(order_type, OrderType::Stop | OrderType::StopLimit);

    if needs_price && request.price.is_none() {
        return Err(ValidationError::MissingPrice {
            order_type: order_type.to_string(),
        });
    }
    if needs_stop_price && request.stop_price.is_none() {
        return Err(ValidationError::MissingStopPrice {
            order_type: order_type.to_string(),
        });
    }

    for price in [request.price, request.stop_price].into_iter().flatten() {
        if !is_valid_price(price) {
            return Err(ValidationError::InvalidPriceRange(price));
        }
    }

    let expiry_date = match &request.expiry_date {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidExpiryFormat(raw.clone()))?;
            if parsed <= today {
                return Err(ValidationError::ExpiryNotInFuture(parsed));
            }
            Some(parsed)
        }
        None => None,
    };

    if let Some(min_quantity) = request.min_quantity {
        if !(1..=request.quantity).contains(&min_quantity) {
            return Err(ValidationError::InvalidMinQuantity {
                min_quantity,
                quantity: request.quantity,
            });
        }
    }
    if let Some(max_show) = request.max_show {
        if !(1..=request.quantity).contains(&max_show) {
            return Err(ValidationError::InvalidMaxShow {
                max_show,
                quantity: request.quantity,
            });
        }
    }

    let symbol_upper = request.symbol.as_str();
    if option_symbols.contains(&symbol_upper) {
        if request.strike_price.is_none() || expiry_date.is_none() || option_type.is_none() {
            return Err(ValidationError::MissingOptionFields {
                symbol: request.symbol.clone(),
            });
        }
    }

    Ok(ValidatedFields {
        side,
        order_type,
        time_in_force,
        option_type,
        expiry_date,
    })
}

fn is_valid_price(price: Decimal) -> bool {
    if price < min_price() || price > max_price() {
        return false;
    }
    price.scale() <= 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> OrderRequest {
        OrderRequest {
            order_id: "T1".into(),
            symbol: "AAPL".into(),
            side: "BUY".into(),
            quantity: 10,
            price: Some(dec!(25.50)),
            stop_price: None,
            order_type: "LIMIT".into(),
            time_in_force: "DAY".into(),
            account: None,
            strike_price: None,
            expiry_date: None,
            option_type: None,
            client_order_id: None,
            min_quantity: None,
            max_show: None,
            text: None,
            extra_fields: Default::default(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    #[test]
    fn accepts_valid_limit_order() {
        let req = base_request();
        assert!(validate(&req, &["SPXW"], today()).is_ok());
    }

    #[test]
    fn rejects_bad_symbol_format() {
        let mut req = base_request();
        req.symbol = "aapl".into();
        assert_eq!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::InvalidSymbolFormat("aapl".into()))
        );
    }

    #[test]
    fn rejects_quantity_out_of_range() {
        let mut req = base_request();
        req.quantity = 0;
        assert_eq!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::QuantityOutOfRange(0))
        );
    }

    #[test]
    fn limit_order_without_price_is_rejected() {
        let mut req = base_request();
        req.price = None;
        assert!(matches!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::MissingPrice { .. })
        ));
    }

    #[test]
    fn expired_expiry_date_is_rejected() {
        let mut req = base_request();
        req.expiry_date = Some("2020-01-01".into());
        assert!(matches!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::ExpiryNotInFuture(_))
        ));
    }

    #[test]
    fn spxw_without_strike_is_rejected() {
        let mut req = base_request();
        req.symbol = "SPXW".into();
        req.expiry_date = Some("2026-08-21".into());
        req.option_type = Some("CALL".into());
        assert!(matches!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::MissingOptionFields { .. })
        ));
    }

    #[test]
    fn spxw_with_all_option_fields_is_accepted() {
        let mut req = base_request();
        req.symbol = "SPXW".into();
        req.strike_price = Some(dec!(4150));
        req.expiry_date = Some("2026-08-21".into());
        req.option_type = Some("CALL".into());
        assert!(validate(&req, &["SPXW"], today()).is_ok());
    }

    #[test]
    fn price_with_too_many_decimals_is_rejected() {
        let mut req = base_request();
        req.price = Some(dec!(25.12345));
        assert!(matches!(
            validate(&req, &["SPXW"], today()),
            Err(ValidationError::InvalidPriceRange(_))
        ));
    }
}

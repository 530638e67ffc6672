//! Outbound FIX message construction (spec.md §4.5, §6).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::{Instrument, OptionType, OrderCancelRequest, OrderReplaceRequest, OrderType, ProcessedOrder, Side, TimeInForce};

use super::types::{tags, FixFieldMap, MsgType, BEGIN_STRING, SOH};

/// Everything the codec needs about the session to stamp the header of an
/// outbound message.
pub struct SessionHeader<'a> {
    pub sender_comp_id: &'a str,
    pub target_comp_id: &'a str,
    pub msg_seq_num: u64,
    pub sending_time: DateTime<Utc>,
}

fn side_code(side: Side) -> &'static str {
    match side {
        Side::Buy => "1",
        Side::Sell => "2",
    }
}

fn ord_type_code(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Market => "1",
        OrderType::Limit => "2",
        OrderType::Stop => "3",
        OrderType::StopLimit => "4",
    }
}

fn tif_code(tif: TimeInForce) -> &'static str {
    match tif {
        TimeInForce::Day => "0",
        TimeInForce::Gtc => "1",
        TimeInForce::Ioc => "3",
        TimeInForce::Fok => "4",
        TimeInForce::Gtd => "6",
    }
}

fn put_or_call_code(option_type: OptionType) -> &'static str {
    match option_type {
        OptionType::Put => "0",
        OptionType::Call => "1",
    }
}

/// Serialize a decimal with trailing zeros trimmed but at least one digit
/// after the point when fractional (spec.md §4.5).
pub fn format_decimal(value: Decimal) -> String {
    let normalized = value.normalize();
    let s = normalized.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d-%H:%M:%S%.3f").to_string()
}

pub fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn append_instrument_fields(body: &mut FixFieldMap, instrument: &Instrument) {
    body.push(tags::SECURITY_TYPE, "OPT");
    body.push(tags::MATURITY_DATE, format_date(instrument.expiry_date));
    body.push(tags::STRIKE_PRICE, format_decimal(instrument.strike_price));
    body.push(tags::PUT_OR_CALL, put_or_call_code(instrument.option_type));
    body.push(tags::SECURITY_EXCHANGE, instrument.exchange.clone());
    body.push(tags::CURRENCY, instrument.currency.clone());
    body.push(tags::SECURITY_ID, instrument.security_id.clone());
    body.push(tags::SECURITY_ID_SOURCE, instrument.security_id_source.clone());
}

/// Build a NewOrderSingle (35=D) body from a [`ProcessedOrder`] (spec.md §6
/// field mapping table). Header/trailer are added by [`wrap`].
pub fn encode_new_order_single(order: &ProcessedOrder, now: DateTime<Utc>) -> FixFieldMap {
    let mut body = FixFieldMap::new();
    body.push(tags::CL_ORD_ID, order.client_order_id.clone());
    body.push(tags::SYMBOL, order.symbol.clone());
    body.push(tags::SIDE, side_code(order.side));
    body.push(tags::TRANSACT_TIME, format_timestamp(now));
    body.push(tags::ORD_TYPE, ord_type_code(order.order_type));
    body.push(tags::ORDER_QTY, order.quantity.to_string());

    if let Some(price) = order.price {
        if matches!(order.order_type, OrderType::Limit | OrderType::StopLimit) {
            body.push(tags::PRICE, format_decimal(price));
        }
    }
    if let Some(stop_price) = order.stop_price {
        if matches!(order.order_type, OrderType::Stop | OrderType::StopLimit) {
            body.push(tags::STOP_PX, format_decimal(stop_price));
        }
    }

    body.push(tags::TIME_IN_FORCE, tif_code(order.time_in_force));

    if let Some(account) = &order.account {
        body.push(tags::ACCOUNT, account.clone());
    }

    if let Some(instrument) = &order.instrument {
        append_instrument_fields(&mut body, instrument);
    }

    if let Some(text) = &order.text {
        body.push(tags::TEXT, text.clone());
    }
    if let Some(min_quantity) = order.min_quantity {
        body.push(tags::MIN_QTY, min_quantity.to_string());
    }
    if let Some(max_show) = order.max_show {
        body.push(tags::MAX_SHOW, max_show.to_string());
    }
    body.push(tags::ORDER_CAPACITY, order.order_capacity.clone());

    body
}

/// Build an OrderCancelRequest (35=F) body, sharing the fields NewOrderSingle
/// and the cancel request have in common (spec.md §6 SUPPLEMENT).
pub fn encode_order_cancel_request(request: &OrderCancelRequest) -> FixFieldMap {
    let mut body = FixFieldMap::new();
    body.push(tags::ORIG_CL_ORD_ID, request.orig_client_order_id.clone());
    body.push(tags::CL_ORD_ID, request.client_order_id.clone());
    body.push(tags::ORDER_ID, request.order_id.clone());
    body.push(tags::SYMBOL, request.symbol.clone());
    body.push(tags::SIDE, side_code(request.side));
    body.push(tags::ORDER_QTY, request.quantity.to_string());
    body.push(tags::TRANSACT_TIME, format_timestamp(request.timestamp));
    if let Some(account) = &request.account {
        body.push(tags::ACCOUNT, account.clone());
    }
    if let Some(text) = &request.text {
        body.push(tags::TEXT, text.clone());
    }
    body
}

/// Build an OrderCancelReplaceRequest (35=G) body (spec.md §6 SUPPLEMENT).
pub fn encode_order_cancel_replace_request(request: &OrderReplaceRequest) -> FixFieldMap {
    let mut body = FixFieldMap::new();
    body.push(tags::ORIG_CL_ORD_ID, request.orig_client_order_id.clone());
    body.push(tags::CL_ORD_ID, request.client_order_id.clone());
    body.push(tags::ORDER_ID, request.order_id.clone());
    body.push(tags::SYMBOL, request.symbol.clone());
    body.push(tags::SIDE, side_code(request.side));
    body.push(tags::TRANSACT_TIME, format_timestamp(request.timestamp));
    body.push(tags::ORD_TYPE, ord_type_code(request.order_type));
    body.push(tags::ORDER_QTY, request.quantity.to_string());
    if let Some(price) = request.price {
        body.push(tags::PRICE, format_decimal(price));
    }
    body.push(tags::TIME_IN_FORCE, tif_code(request.time_in_force));
    if let Some(account) = &request.account {
        body.push(tags::ACCOUNT, account.clone());
    }
    if let Some(text) = &request.text {
        body.push(tags::TEXT, text.clone());
    }
    body
}

/// Wrap a body in the standard header/trailer, compute BodyLength and
/// CheckSum, and serialize to SOH-delimited bytes (spec.md §4.5).
pub fn wrap(msg_type: MsgType, header: &SessionHeader, body: &FixFieldMap) -> Vec<u8> {
    let mut header_and_body = FixFieldMap::new();
    header_and_body.push(tags::MSG_TYPE, msg_type.as_fix_str());
    header_and_body.push(tags::SENDER_COMP_ID, header.sender_comp_id);
    header_and_body.push(tags::TARGET_COMP_ID, header.target_comp_id);
    header_and_body.push(tags::MSG_SEQ_NUM, header.msg_seq_num.to_string());
    header_and_body.push(tags::SENDING_TIME, format_timestamp(header.sending_time));
    for (tag, value) in body.iter() {
        header_and_body.push(*tag, value.clone());
    }

    let body_bytes = render_fields(&header_and_body);
    let body_length = body_bytes.len();

    let mut message = Vec::new();
    message.extend_from_slice(format!("8={BEGIN_STRING}").as_bytes());
    message.push(SOH);
    message.extend_from_slice(format!("9={body_length}").as_bytes());
    message.push(SOH);
    message.extend_from_slice(&body_bytes);

    let checksum = compute_checksum(&message);
    message.extend_from_slice(format!("10={checksum:03}").as_bytes());
    message.push(SOH);
    message
}

fn render_fields(fields: &FixFieldMap) -> Vec<u8> {
    let mut out = Vec::new();
    for (tag, value) in fields.iter() {
        out.extend_from_slice(format!("{tag}={value}").as_bytes());
        out.push(SOH);
    }
    out
}

/// Sum of all bytes mod 256 (spec.md §4.5).
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u32, |acc, &b| acc + b as u32) as u8
}

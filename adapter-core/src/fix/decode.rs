//! Inbound FIX message parsing (spec.md §4.5).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::CodecError;
use crate::model::{CancelRejectResponseTo, ExecType, ExecutionReport, OrdStatus, OrderCancelReject, Side};

use super::encode::compute_checksum;
use super::types::{tags, FixFieldMap, MsgType, BEGIN_STRING, SOH};

/// A decoded message: its dispatch tag plus the raw field map for further
/// interpretation by [`super::session`] or [`crate::gateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub msg_type: MsgType,
    pub msg_seq_num: u64,
    pub poss_dup: bool,
    pub fields: FixFieldMap,
}

/// Split on SOH, validate BeginString/BodyLength/CheckSum, and dispatch on
/// MsgType (spec.md §4.5 "Parsing").
pub fn parse(raw: &[u8]) -> Result<DecodedMessage, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }

    let text = String::from_utf8_lossy(raw);
    let mut fields = FixFieldMap::new();
    for field in text.split(SOH as char).filter(|s| !s.is_empty()) {
        let (tag_str, value) = field.split_once('=').ok_or_else(|| CodecError::MalformedField(field.to_string()))?;
        let tag: u32 = tag_str.parse().map_err(|_| CodecError::InvalidTag(tag_str.to_string()))?;
        fields.push(tag, value);
    }

    let begin_string = fields.get(tags::BEGIN_STRING).ok_or(CodecError::MissingTag(tags::BEGIN_STRING))?;
    if begin_string != BEGIN_STRING {
        return Err(CodecError::UnsupportedBeginString(begin_string.to_string()));
    }

    let declared_body_length: usize = fields
        .get(tags::BODY_LENGTH)
        .ok_or(CodecError::MissingTag(tags::BODY_LENGTH))?
        .parse()
        .map_err(|_| CodecError::InvalidFieldValue {
            tag: tags::BODY_LENGTH,
            value: fields.get(tags::BODY_LENGTH).unwrap_or_default().to_string(),
        })?;

    let measured_body_length = measure_body_length(&text)?;
    if declared_body_length != measured_body_length {
        return Err(CodecError::BodyLengthMismatch {
            declared: declared_body_length,
            measured: measured_body_length,
        });
    }

    verify_checksum(raw, &fields)?;

    let msg_type_str = fields.get(tags::MSG_TYPE).ok_or(CodecError::MissingTag(tags::MSG_TYPE))?;
    let msg_type = MsgType::from_fix_str(msg_type_str).ok_or_else(|| CodecError::UnsupportedMsgType(msg_type_str.to_string()))?;

    let msg_seq_num: u64 = fields
        .get(tags::MSG_SEQ_NUM)
        .ok_or(CodecError::MissingTag(tags::MSG_SEQ_NUM))?
        .parse()
        .map_err(|_| CodecError::InvalidFieldValue {
            tag: tags::MSG_SEQ_NUM,
            value: fields.get(tags::MSG_SEQ_NUM).unwrap_or_default().to_string(),
        })?;

    let poss_dup = fields.get(tags::POSS_DUP_FLAG) == Some("Y");

    Ok(DecodedMessage {
        msg_type,
        msg_seq_num,
        poss_dup,
        fields,
    })
}

fn measure_body_length(text: &str) -> Result<usize, CodecError> {
    let begin_string_field_end = text.find(SOH as char).ok_or(CodecError::Empty)?;
    let after_begin = &text[begin_string_field_end + 1..];
    let body_length_field_end = after_begin.find(SOH as char).ok_or(CodecError::Empty)?;
    let body_start = begin_string_field_end + 1 + body_length_field_end + 1;

    let checksum_field_start = text.rfind(&format!("{}{}=", SOH as char, tags::CHECKSUM)).map(|i| i + 1);
    let body_end = checksum_field_start.unwrap_or(text.len());
    Ok(body_end.saturating_sub(body_start))
}

fn verify_checksum(raw: &[u8], fields: &FixFieldMap) -> Result<(), CodecError> {
    let declared: u8 = fields
        .get(tags::CHECKSUM)
        .ok_or(CodecError::MissingTag(tags::CHECKSUM))?
        .parse()
        .map_err(|_| CodecError::InvalidFieldValue {
            tag: tags::CHECKSUM,
            value: fields.get(tags::CHECKSUM).unwrap_or_default().to_string(),
        })?;

    let text = String::from_utf8_lossy(raw);
    let checksum_tag_start = text.rfind(&format!("{}=", tags::CHECKSUM)).ok_or(CodecError::MissingTag(tags::CHECKSUM))?;
    let body_for_checksum = &raw[..checksum_tag_start];
    let computed = compute_checksum(body_for_checksum);

    if computed != declared {
        return Err(CodecError::ChecksumMismatch { declared, computed });
    }
    Ok(())
}

fn parse_tag<T: FromStr>(fields: &FixFieldMap, tag: u32) -> Result<T, CodecError> {
    let raw = fields.get(tag).ok_or(CodecError::MissingTag(tag))?;
    raw.parse().map_err(|_| CodecError::InvalidFieldValue {
        tag,
        value: raw.to_string(),
    })
}

fn parse_optional<T: FromStr>(fields: &FixFieldMap, tag: u32) -> Result<Option<T>, CodecError> {
    match fields.get(tag) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CodecError::InvalidFieldValue { tag, value: raw.to_string() }),
    }
}

fn parse_transact_time(raw: &str) -> Result<DateTime<Utc>, CodecError> {
    let naive = chrono::NaiveDateTime::parse_from_str(raw, "%Y%m%d-%H:%M:%S%.f")
        .map_err(|_| CodecError::InvalidFieldValue { tag: tags::TRANSACT_TIME, value: raw.to_string() })?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn exec_type_from_fix(code: &str) -> Result<ExecType, CodecError> {
    Ok(match code {
        "0" => ExecType::New,
        "1" => ExecType::PartialFill,
        "2" => ExecType::Fill,
        "4" => ExecType::Canceled,
        "5" => ExecType::Replaced,
        "6" => ExecType::PendingCancel,
        "8" => ExecType::Rejected,
        "C" => ExecType::Expired,
        "E" => ExecType::PendingReplace,
        other => return Err(CodecError::InvalidFieldValue { tag: tags::EXEC_TYPE, value: other.to_string() }),
    })
}

fn side_from_fix(code: &str) -> Result<Side, CodecError> {
    Ok(match code {
        "1" => Side::Buy,
        "2" => Side::Sell,
        other => return Err(CodecError::InvalidFieldValue { tag: tags::SIDE, value: other.to_string() }),
    })
}

fn ord_status_from_fix(code: &str) -> Result<OrdStatus, CodecError> {
    Ok(match code {
        "0" => OrdStatus::New,
        "1" => OrdStatus::PartiallyFilled,
        "2" => OrdStatus::Filled,
        "3" => OrdStatus::DoneForDay,
        "4" => OrdStatus::Canceled,
        "6" => OrdStatus::PendingCancel,
        "8" => OrdStatus::Rejected,
        "A" => OrdStatus::PendingNew,
        "C" => OrdStatus::Expired,
        "E" => OrdStatus::PendingReplace,
        other => return Err(CodecError::InvalidFieldValue { tag: tags::ORD_STATUS, value: other.to_string() }),
    })
}

/// Decode an ExecutionReport (35=8) body into [`ExecutionReport`].
pub fn decode_execution_report(fields: &FixFieldMap) -> Result<ExecutionReport, CodecError> {
    let exec_type = exec_type_from_fix(fields.get(tags::EXEC_TYPE).ok_or(CodecError::MissingTag(tags::EXEC_TYPE))?)?;
    let ord_status = ord_status_from_fix(fields.get(tags::ORD_STATUS).ok_or(CodecError::MissingTag(tags::ORD_STATUS))?)?;
    let side = side_from_fix(fields.get(tags::SIDE).ok_or(CodecError::MissingTag(tags::SIDE))?)?;

    Ok(ExecutionReport {
        order_id: parse_tag::<String>(fields, tags::ORDER_ID)?,
        client_order_id: parse_tag::<String>(fields, tags::CL_ORD_ID)?,
        orig_client_order_id: fields.get(tags::ORIG_CL_ORD_ID).map(str::to_string),
        exec_id: parse_tag::<String>(fields, tags::EXEC_ID)?,
        exec_type,
        ord_status,
        symbol: parse_tag::<String>(fields, tags::SYMBOL)?,
        side,
        order_qty: parse_tag::<i64>(fields, tags::ORDER_QTY)?,
        cum_qty: parse_tag::<i64>(fields, tags::CUM_QTY)?,
        leaves_qty: parse_tag::<i64>(fields, tags::LEAVES_QTY)?,
        last_qty: parse_optional::<i64>(fields, tags::LAST_QTY)?,
        last_price: parse_optional::<Decimal>(fields, tags::LAST_PX)?,
        avg_price: parse_optional::<Decimal>(fields, tags::AVG_PX)?,
        transact_time: fields
            .get(tags::TRANSACT_TIME)
            .map(parse_transact_time)
            .transpose()?
            .unwrap_or_else(Utc::now),
        account: fields.get(tags::ACCOUNT).map(str::to_string),
        text: fields.get(tags::TEXT).map(str::to_string),
    })
}

fn cxl_rej_response_to_from_fix(code: &str) -> Result<CancelRejectResponseTo, CodecError> {
    Ok(match code {
        "1" => CancelRejectResponseTo::OrderCancelRequest,
        "2" => CancelRejectResponseTo::OrderCancelReplaceRequest,
        other => {
            return Err(CodecError::InvalidFieldValue {
                tag: tags::CXL_REJ_RESPONSE_TO,
                value: other.to_string(),
            })
        }
    })
}

/// Decode an OrderCancelReject (35=9) body into [`OrderCancelReject`].
pub fn decode_order_cancel_reject(fields: &FixFieldMap) -> Result<OrderCancelReject, CodecError> {
    let ord_status = ord_status_from_fix(fields.get(tags::ORD_STATUS).ok_or(CodecError::MissingTag(tags::ORD_STATUS))?)?;
    let cxl_rej_response_to = cxl_rej_response_to_from_fix(
        fields.get(tags::CXL_REJ_RESPONSE_TO).ok_or(CodecError::MissingTag(tags::CXL_REJ_RESPONSE_TO))?,
    )?;

    Ok(OrderCancelReject {
        order_id: parse_tag::<String>(fields, tags::ORDER_ID)?,
        client_order_id: parse_tag::<String>(fields, tags::CL_ORD_ID)?,
        orig_client_order_id: parse_tag::<String>(fields, tags::ORIG_CL_ORD_ID)?,
        ord_status,
        cxl_rej_response_to,
        cxl_rej_reason: parse_optional::<i32>(fields, tags::CXL_REJ_REASON)?,
        text: fields.get(tags::TEXT).map(str::to_string),
    })
}

/// Parse `YYYYMMDD` tags (MaturityDate, and expiry checks elsewhere).
pub fn parse_fix_date(raw: &str) -> Result<NaiveDate, CodecError> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| CodecError::InvalidFieldValue {
        tag: tags::MATURITY_DATE,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::encode::{encode_new_order_single, wrap, SessionHeader};
    use crate::fix::types::MsgType;
    use crate::model::{OrderRequest, OrderType, ProcessedOrder, Side, TimeInForce};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_order() -> ProcessedOrder {
        let req = OrderRequest {
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
        };
        ProcessedOrder::new(&req, Side::Buy, OrderType::Limit, TimeInForce::Day, None, None, None, Utc::now())
    }

    #[test]
    fn round_trips_an_encoded_new_order_single() {
        let header = SessionHeader {
            sender_comp_id: "ADAPTER",
            target_comp_id: "BROKER",
            msg_seq_num: 7,
            sending_time: Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap(),
        };
        let body = encode_new_order_single(&sample_order(), Utc::now());
        let wire = wrap(MsgType::NewOrderSingle, &header, &body);

        let decoded = parse(&wire).unwrap();
        assert_eq!(decoded.msg_type, MsgType::NewOrderSingle);
        assert_eq!(decoded.msg_seq_num, 7);
        assert_eq!(decoded.fields.get(tags::CL_ORD_ID), Some("T1"));
    }

    #[test]
    fn rejects_wrong_begin_string() {
        let raw = b"8=FIX.4.2\x019=5\x0135=0\x0110=000\x01";
        assert!(matches!(parse(raw), Err(CodecError::UnsupportedBeginString(_))));
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let header = SessionHeader {
            sender_comp_id: "ADAPTER",
            target_comp_id: "BROKER",
            msg_seq_num: 1,
            sending_time: Utc::now(),
        };
        let body = encode_new_order_single(&sample_order(), Utc::now());
        let mut wire = wrap(MsgType::NewOrderSingle, &header, &body);
        let len = wire.len();
        // Corrupt the checksum digit just before the trailing SOH.
        wire[len - 2] = if wire[len - 2] == b'0' { b'1' } else { b'0' };
        assert!(matches!(parse(&wire), Err(CodecError::ChecksumMismatch { .. })));
    }
}

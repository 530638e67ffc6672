//! End-to-end scenarios from spec.md §8.

use adapter_core::config::RiskLimits;
use adapter_core::error::{ProcessingError, RiskError, ValidationError};
use adapter_core::fix::{encode_new_order_single, parse, tags, wrap, FixFieldMap, MemorySequenceStore, MsgType, SequenceStore, Session, SessionHeader, SessionState};
use adapter_core::gateway::Gateway;
use adapter_core::model::{ExecType, ExecutionReport, OrderRequest, OrdStatus, Side};
use adapter_core::processor::OrderProcessor;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn risk_limits() -> RiskLimits {
    RiskLimits {
        max_order_size: 1000,
        max_daily_volume: 10_000,
        max_orders_per_second: 10,
        max_position_size: 5000,
        min_option_price: dec!(0.05),
        enabled: true,
    }
}

fn base_request(order_id: &str) -> OrderRequest {
    OrderRequest {
        order_id: order_id.into(),
        symbol: "AAPL".into(),
        side: "BUY".into(),
        quantity: 10,
        price: Some(dec!(25.50)),
        stop_price: None,
        order_type: "LIMIT".into(),
        time_in_force: "DAY".into(),
        account: Some("A1".into()),
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

#[test]
fn scenario_1_happy_path_spxw_call() {
    let processor = OrderProcessor::new(["SPXW".to_string()], risk_limits());

    let expiry = (Utc::now().date_naive() + chrono::Duration::days(7)).format("%Y-%m-%d").to_string();
    let mut req = base_request("T1");
    req.symbol = "SPXW".into();
    req.quantity = 10;
    req.strike_price = Some(dec!(4150));
    req.expiry_date = Some(expiry.clone());
    req.option_type = Some("CALL".into());

    let processed = processor.process(&req).expect("happy path order must be admitted");
    let body = encode_new_order_single(&processed, Utc::now());

    assert_eq!(body.get(tags::CL_ORD_ID), Some("T1"));
    assert_eq!(body.get(tags::SYMBOL), Some("SPXW"));
    assert_eq!(body.get(tags::SIDE), Some("1"));
    assert_eq!(body.get(tags::ORDER_QTY), Some("10"));
    assert_eq!(body.get(tags::PRICE), Some("25.5"));
    assert_eq!(body.get(tags::ORD_TYPE), Some("2"));
    assert_eq!(body.get(tags::TIME_IN_FORCE), Some("0"));
    assert_eq!(body.get(tags::SECURITY_TYPE), Some("OPT"));
    assert_eq!(body.get(tags::PUT_OR_CALL), Some("1"));
    assert_eq!(body.get(tags::STRIKE_PRICE), Some("4150.0"));

    let expected_maturity = (Utc::now().date_naive() + chrono::Duration::days(7)).format("%Y%m%d").to_string();
    assert_eq!(body.get(tags::MATURITY_DATE), Some(expected_maturity.as_str()));
}

#[test]
fn scenario_2_expired_option_is_rejected_before_fix_is_built() {
    let processor = OrderProcessor::new(["SPXW".to_string()], risk_limits());
    let yesterday = (Utc::now().date_naive() - chrono::Duration::days(1)).format("%Y-%m-%d").to_string();

    let mut req = base_request("T2");
    req.symbol = "SPXW".into();
    req.strike_price = Some(dec!(4150));
    req.expiry_date = Some(yesterday);
    req.option_type = Some("CALL".into());

    let err = processor.process(&req).unwrap_err();
    assert!(matches!(err, ProcessingError::Validation(ValidationError::ExpiryNotInFuture(_))));
}

#[test]
fn scenario_3_missing_strike_for_spxw_is_rejected() {
    let processor = OrderProcessor::new(["SPXW".to_string()], risk_limits());
    let expiry = (Utc::now().date_naive() + chrono::Duration::days(7)).format("%Y-%m-%d").to_string();

    let mut req = base_request("T3");
    req.symbol = "SPXW".into();
    req.expiry_date = Some(expiry);
    req.option_type = Some("CALL".into());
    req.strike_price = None;

    let err = processor.process(&req).unwrap_err();
    assert!(matches!(err, ProcessingError::Validation(ValidationError::MissingOptionFields { .. })));
}

#[test]
fn scenario_4_rate_limit_rejects_the_fourth_order() {
    let mut limits = risk_limits();
    limits.max_orders_per_second = 3;
    let processor = OrderProcessor::new(["SPXW".to_string()], limits);

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..4 {
        let req = base_request(&format!("T4-{i}"));
        match processor.process(&req) {
            Ok(_) => accepted += 1,
            Err(ProcessingError::Risk(RiskError::RateLimitExceeded { .. })) => rejected += 1,
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }
    assert_eq!(accepted, 3);
    assert_eq!(rejected, 1);
}

#[test]
fn scenario_5_partial_fill_then_full_fill_updates_position_and_avg_price() {
    let processor = OrderProcessor::new(["SPXW".to_string()], risk_limits());
    let req = base_request("T5");
    let processed = processor.process(&req).unwrap();

    let config = adapter_core::config::FixSessionConfig {
        sender_comp_id: "ADAPTER".into(),
        target_comp_id: "BROKER".into(),
        heartbeat_interval_secs: 30,
        reconnect_interval_secs: 5,
        logon_timeout_secs: 10,
    };
    let store = Arc::new(MemorySequenceStore::new());
    let mut session = Session::new(config, store);
    session.connect(Utc::now()).unwrap();
    let mut logon_body = FixFieldMap::new();
    logon_body.push(tags::HEART_BT_INT, "30");
    let header = SessionHeader {
        sender_comp_id: "BROKER",
        target_comp_id: "ADAPTER",
        msg_seq_num: 1,
        sending_time: Utc::now(),
    };
    let logon_wire = wrap(MsgType::Logon, &header, &logon_body);
    let decoded_logon = parse(&logon_wire).unwrap();
    session.handle_inbound(&decoded_logon, Utc::now()).unwrap();
    assert_eq!(session.state(), SessionState::Active);

    let mut gateway = Gateway::new(&mut session, processor.risk_engine());
    gateway.send_order(processed.clone()).unwrap();

    let partial = ExecutionReport {
        order_id: "B1".into(),
        client_order_id: processed.client_order_id.clone(),
        orig_client_order_id: None,
        exec_id: "E1".into(),
        exec_type: ExecType::PartialFill,
        ord_status: OrdStatus::PartiallyFilled,
        symbol: "AAPL".into(),
        side: Side::Buy,
        order_qty: 10,
        cum_qty: 4,
        leaves_qty: 6,
        last_qty: Some(4),
        last_price: Some(dec!(25.00)),
        avg_price: Some(dec!(25.00)),
        transact_time: Utc::now(),
        account: None,
        text: None,
    };
    gateway.apply_execution_report(&partial);
    assert_eq!(gateway.outstanding_count(), 1);

    let full = ExecutionReport {
        order_id: "B1".into(),
        client_order_id: processed.client_order_id.clone(),
        orig_client_order_id: None,
        exec_id: "E2".into(),
        exec_type: ExecType::Fill,
        ord_status: OrdStatus::Filled,
        symbol: "AAPL".into(),
        side: Side::Buy,
        order_qty: 10,
        cum_qty: 10,
        leaves_qty: 0,
        last_qty: Some(6),
        last_price: Some(dec!(26.00)),
        avg_price: Some(dec!(25.60)),
        transact_time: Utc::now(),
        account: None,
        text: None,
    };
    gateway.apply_execution_report(&full);

    assert_eq!(gateway.outstanding_count(), 0);
    assert_eq!(processor.risk_engine().status().position("AAPL"), 10);
}

#[test]
fn scenario_6_reconnect_preserves_sequence_and_a_gap_triggers_resend() {
    let config = adapter_core::config::FixSessionConfig {
        sender_comp_id: "ADAPTER".into(),
        target_comp_id: "BROKER".into(),
        heartbeat_interval_secs: 30,
        reconnect_interval_secs: 5,
        logon_timeout_secs: 10,
    };
    let store = Arc::new(MemorySequenceStore::new());

    {
        let mut session = Session::new(config.clone(), store.clone());
        session.connect(Utc::now()).unwrap();
        assert_eq!(store.next_out_seq().unwrap(), 2);
    }

    // Reconnect: a fresh Session over the same store resumes at stored_last + 1.
    let mut session = Session::new(config, store.clone());
    session.connect(Utc::now()).unwrap();
    assert_eq!(store.next_out_seq().unwrap(), 3);

    let mut logon_body = FixFieldMap::new();
    logon_body.push(tags::HEART_BT_INT, "30");
    let header = SessionHeader {
        sender_comp_id: "BROKER",
        target_comp_id: "ADAPTER",
        msg_seq_num: 1,
        sending_time: Utc::now(),
    };
    let logon_wire = wrap(MsgType::Logon, &header, &logon_body);
    session.handle_inbound(&parse(&logon_wire).unwrap(), Utc::now()).unwrap();
    assert_eq!(session.state(), SessionState::Active);

    // A gapped inbound sequence (3 when 2 was expected) must trigger a resend.
    let gap_header = SessionHeader {
        sender_comp_id: "BROKER",
        target_comp_id: "ADAPTER",
        msg_seq_num: 3,
        sending_time: Utc::now(),
    };
    let heartbeat_wire = wrap(MsgType::Heartbeat, &gap_header, &FixFieldMap::new());
    let action = session.handle_inbound(&parse(&heartbeat_wire).unwrap(), Utc::now()).unwrap();
    match action {
        adapter_core::fix::SessionAction::Send(bytes) => {
            let text = String::from_utf8(bytes).unwrap();
            assert!(text.contains(&format!("{}=2", tags::MSG_TYPE)));
        }
        other => panic!("expected a ResendRequest send action, got {other:?}"),
    }

    // The gapped message (seq 3) is queued, not discarded: filling the
    // missing seq 2 must replay it (both are plain Heartbeats here, so a
    // successful replay leaves the session silently caught up) rather than
    // silently skipping it and leaving the in-sequence counter stuck.
    let fill_header = SessionHeader {
        sender_comp_id: "BROKER",
        target_comp_id: "ADAPTER",
        msg_seq_num: 2,
        sending_time: Utc::now(),
    };
    let fill_wire = wrap(MsgType::Heartbeat, &fill_header, &FixFieldMap::new());
    let fill_action = session.handle_inbound(&parse(&fill_wire).unwrap(), Utc::now()).unwrap();
    assert!(matches!(fill_action, adapter_core::fix::SessionAction::None));

    // The next inbound message must be expected at seq 4: seq 3 was
    // consumed by the replay, not left stranded in the gap.
    let next_header = SessionHeader {
        sender_comp_id: "BROKER",
        target_comp_id: "ADAPTER",
        msg_seq_num: 4,
        sending_time: Utc::now(),
    };
    let next_wire = wrap(MsgType::Heartbeat, &next_header, &FixFieldMap::new());
    let next_action = session.handle_inbound(&parse(&next_wire).unwrap(), Utc::now()).unwrap();
    assert!(matches!(next_action, adapter_core::fix::SessionAction::None));
}

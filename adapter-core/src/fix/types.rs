//! Wire-level building blocks shared by [`super::encode`] and [`super::decode`].

use std::collections::BTreeMap;

pub const SOH: u8 = 0x01;
pub const BEGIN_STRING: &str = "FIX.4.4";

pub mod tags {
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const MSG_TYPE: u32 = 35;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const SENDING_TIME: u32 = 52;
    pub const CHECKSUM: u32 = 10;
    pub const POSS_DUP_FLAG: u32 = 43;

    pub const CL_ORD_ID: u32 = 11;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const ORDER_ID: u32 = 37;
    pub const SYMBOL: u32 = 55;
    pub const SIDE: u32 = 54;
    pub const TRANSACT_TIME: u32 = 60;
    pub const ORD_TYPE: u32 = 40;
    pub const ORDER_QTY: u32 = 38;
    pub const PRICE: u32 = 44;
    pub const STOP_PX: u32 = 99;
    pub const TIME_IN_FORCE: u32 = 59;
    pub const ACCOUNT: u32 = 1;
    pub const SECURITY_TYPE: u32 = 167;
    pub const MATURITY_DATE: u32 = 541;
    pub const STRIKE_PRICE: u32 = 202;
    pub const PUT_OR_CALL: u32 = 201;
    pub const SECURITY_EXCHANGE: u32 = 207;
    pub const CURRENCY: u32 = 15;
    pub const SECURITY_ID: u32 = 48;
    pub const SECURITY_ID_SOURCE: u32 = 22;
    pub const TEXT: u32 = 58;
    pub const MIN_QTY: u32 = 110;
    pub const MAX_SHOW: u32 = 210;
    pub const ORDER_CAPACITY: u32 = 528;

    pub const EXEC_ID: u32 = 17;
    pub const EXEC_TYPE: u32 = 150;
    pub const ORD_STATUS: u32 = 39;
    pub const CUM_QTY: u32 = 14;
    pub const LEAVES_QTY: u32 = 151;
    pub const LAST_QTY: u32 = 32;
    pub const LAST_PX: u32 = 31;
    pub const AVG_PX: u32 = 6;

    pub const CXL_REJ_RESPONSE_TO: u32 = 434;
    pub const CXL_REJ_REASON: u32 = 102;

    pub const BEGIN_SEQ_NO: u32 = 7;
    pub const END_SEQ_NO: u32 = 16;
    pub const NEW_SEQ_NO: u32 = 36;
    pub const GAP_FILL_FLAG: u32 = 123;
    pub const TEST_REQ_ID: u32 = 112;
    pub const HEART_BT_INT: u32 = 108;
    pub const REF_SEQ_NUM: u32 = 45;
    pub const REF_TAG_ID: u32 = 371;
    pub const SESSION_REJECT_REASON: u32 = 373;
}

/// An inbound or outbound FIX message, decomposed into ordered tag/value
/// pairs. `BTreeMap` would lose duplicate-tag and ordering information, so
/// repeating fields and field order are preserved in the `Vec`; lookups go
/// through [`FixFieldMap::get`] for convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixFieldMap {
    fields: Vec<(u32, String)>,
}

impl FixFieldMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        self.fields.push((tag, value.into()));
        self
    }

    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields.iter().find(|(t, _)| *t == tag).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, String)> {
        self.fields.iter()
    }

    /// Collapse to a first-value-wins map; used by decode once field order no
    /// longer matters for a given message type.
    pub fn to_map(&self) -> BTreeMap<u32, String> {
        let mut map = BTreeMap::new();
        for (tag, value) in &self.fields {
            map.entry(*tag).or_insert_with(|| value.clone());
        }
        map
    }
}

impl Default for FixFieldMap {
    fn default() -> Self {
        Self::new()
    }
}

/// The session state machine of spec.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    LogonSent,
    Active,
    LogoutSent,
    Disconnecting,
}

/// Dispatch tag for supported inbound/outbound message types (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Heartbeat,
    TestRequest,
    ResendRequest,
    Reject,
    SequenceReset,
    Logon,
    Logout,
    NewOrderSingle,
    ExecutionReport,
    OrderCancelRequest,
    OrderCancelReject,
    OrderCancelReplaceRequest,
}

impl MsgType {
    pub fn as_fix_str(&self) -> &'static str {
        match self {
            MsgType::Heartbeat => "0",
            MsgType::TestRequest => "1",
            MsgType::ResendRequest => "2",
            MsgType::Reject => "3",
            MsgType::SequenceReset => "4",
            MsgType::Logon => "A",
            MsgType::Logout => "5",
            MsgType::NewOrderSingle => "D",
            MsgType::ExecutionReport => "8",
            MsgType::OrderCancelRequest => "F",
            MsgType::OrderCancelReject => "9",
            MsgType::OrderCancelReplaceRequest => "G",
        }
    }

    pub fn from_fix_str(s: &str) -> Option<Self> {
        Some(match s {
            "0" => MsgType::Heartbeat,
            "1" => MsgType::TestRequest,
            "2" => MsgType::ResendRequest,
            "3" => MsgType::Reject,
            "4" => MsgType::SequenceReset,
            "A" => MsgType::Logon,
            "5" => MsgType::Logout,
            "D" => MsgType::NewOrderSingle,
            "8" => MsgType::ExecutionReport,
            "F" => MsgType::OrderCancelRequest,
            "9" => MsgType::OrderCancelReject,
            "G" => MsgType::OrderCancelReplaceRequest,
            _ => return None,
        })
    }
}

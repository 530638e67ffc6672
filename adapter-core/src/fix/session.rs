//! The FIX session state machine (spec.md §4.6).
//!
//! [`Session`] holds no socket. It consumes inbound [`DecodedMessage`]s and
//! produces [`SessionAction`]s (bytes to write, or a disconnect/reconnect
//! directive); the binary's transport loop is the only thing that touches a
//! socket. This mirrors how the teacher keeps its execution-state machines
//! free of I/O so they can be driven directly in tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::FixSessionConfig;
use crate::error::SessionError;

use super::decode::DecodedMessage;
use super::encode::{wrap, SessionHeader};
use super::store::SequenceStore;
use super::types::{tags, FixFieldMap, MsgType, SessionState};

/// Directive for the transport loop to carry out after a [`Session`] method
/// returns. A single call can only produce one action; callers that need to
/// send and then disconnect issue two calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Send(Vec<u8>),
    Disconnect,
    ScheduleReconnect { after: Duration },
    None,
}

/// Drives [`SessionState`] transitions and sequence-number bookkeeping for
/// one logical FIX session.
pub struct Session {
    config: FixSessionConfig,
    store: Arc<dyn SequenceStore>,
    state: SessionState,
    last_sent_at: Option<DateTime<Utc>>,
    last_received_at: Option<DateTime<Utc>>,
    test_request_outstanding: bool,
    pending_resend_until: Option<u64>,
    /// Messages received with a sequence number ahead of what's expected,
    /// held here until the ResendRequest gap is filled (spec.md §4.6: "send
    /// ResendRequest for the gap and queue messages until filled").
    pending_messages: Vec<DecodedMessage>,
}

impl Session {
    pub fn new(config: FixSessionConfig, store: Arc<dyn SequenceStore>) -> Self {
        Self {
            config,
            store,
            state: SessionState::Disconnected,
            last_sent_at: None,
            last_received_at: None,
            test_request_outstanding: false,
            pending_resend_until: None,
            pending_messages: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn next_out_seq(&self) -> Result<u64, SessionError> {
        self.store.next_out_seq().map_err(|e| SessionError::Transport(e.to_string()))
    }

    /// Stamp, persist, then serialize an outbound admin/app message. The
    /// sequence number is written to the store before the bytes are handed
    /// back to the caller (spec.md §4.6 "persisted ... BEFORE transport write").
    fn stamp_and_wrap(&mut self, msg_type: MsgType, body: &FixFieldMap, now: DateTime<Utc>) -> Result<Vec<u8>, SessionError> {
        let seq = self.next_out_seq()?;
        self.store.set_next_out_seq(seq + 1).map_err(|e| SessionError::Transport(e.to_string()))?;

        let header = SessionHeader {
            sender_comp_id: &self.config.sender_comp_id,
            target_comp_id: &self.config.target_comp_id,
            msg_seq_num: seq,
            sending_time: now,
        };
        let wire = wrap(msg_type, &header, body);
        self.store.store_outbound(seq, &wire).map_err(|e| SessionError::Transport(e.to_string()))?;
        self.last_sent_at = Some(now);
        Ok(wire)
    }

    /// `DISCONNECTED` → `CONNECTING` → send Logon → `LOGON_SENT`.
    pub fn connect(&mut self, now: DateTime<Utc>) -> Result<SessionAction, SessionError> {
        self.state = SessionState::Connecting;
        let mut body = FixFieldMap::new();
        body.push(tags::HEART_BT_INT, self.config.heartbeat_interval_secs.to_string());
        let wire = self.stamp_and_wrap(MsgType::Logon, &body, now)?;
        self.state = SessionState::LogonSent;
        Ok(SessionAction::Send(wire))
    }

    /// Request an orderly stop: `ACTIVE` → send Logout → `LOGOUT_SENT`.
    pub fn request_logout(&mut self, now: DateTime<Utc>) -> Result<SessionAction, SessionError> {
        let body = FixFieldMap::new();
        let wire = self.stamp_and_wrap(MsgType::Logout, &body, now)?;
        self.state = SessionState::LogoutSent;
        Ok(SessionAction::Send(wire))
    }

    /// Submit an already-encoded application body (NewOrderSingle, cancel,
    /// cancel/replace) for sequencing and wrapping. Returns `Err` if the
    /// session is not `ACTIVE` (spec.md §4.8 step 1 is enforced by the
    /// Gateway; this is the session-layer counterpart for admin sends).
    pub fn send_app_message(&mut self, msg_type: MsgType, body: &FixFieldMap, now: DateTime<Utc>) -> Result<Vec<u8>, SessionError> {
        self.stamp_and_wrap(msg_type, body, now)
    }

    /// Handle one inbound decoded message, advancing sequence state and the
    /// session's lifecycle per spec.md §4.6.
    ///
    /// A message that arrives ahead of the expected sequence number is held
    /// in [`Self::pending_messages`] rather than applied; once the missing
    /// messages are resent and the gap is filled, the buffered messages are
    /// replayed in order (spec.md §4.6 "queue messages until filled").
    pub fn handle_inbound(&mut self, msg: &DecodedMessage, now: DateTime<Utc>) -> Result<SessionAction, SessionError> {
        self.last_received_at = Some(now);
        self.test_request_outstanding = false;

        let expected = self.store.next_in_seq().map_err(|e| SessionError::Transport(e.to_string()))?;

        if msg.msg_seq_num < expected && !msg.poss_dup {
            self.state = SessionState::Disconnecting;
            return Err(SessionError::SequenceTooLow {
                received: msg.msg_seq_num,
                expected,
            });
        }

        if msg.msg_seq_num > expected {
            let already_pending = self.pending_resend_until.is_some();
            self.pending_resend_until = Some(match self.pending_resend_until {
                Some(until) => until.max(msg.msg_seq_num - 1),
                None => msg.msg_seq_num - 1,
            });
            self.pending_messages.push(msg.clone());

            if already_pending {
                return Ok(SessionAction::None);
            }
            let mut body = FixFieldMap::new();
            body.push(tags::BEGIN_SEQ_NO, expected.to_string());
            body.push(tags::END_SEQ_NO, "0");
            let wire = self.stamp_and_wrap(MsgType::ResendRequest, &body, now)?;
            return Ok(SessionAction::Send(wire));
        }

        self.store.set_next_in_seq(expected + 1).map_err(|e| SessionError::Transport(e.to_string()))?;
        let mut action = self.apply_in_sequence(msg, now)?;

        // The gap is filled one message at a time: each arrival (live or
        // resent) may unblock a message that was buffered ahead of it, so
        // check the buffer for the new expected sequence before deciding
        // the gap itself is closed.
        while self.pending_resend_until.is_some() {
            let next_expected = self.store.next_in_seq().map_err(|e| SessionError::Transport(e.to_string()))?;
            let Some(pos) = self.pending_messages.iter().position(|m| m.msg_seq_num == next_expected) else {
                if let Some(until) = self.pending_resend_until {
                    if next_expected > until {
                        self.pending_resend_until = None;
                    }
                }
                break;
            };
            let buffered = self.pending_messages.remove(pos);
            self.store.set_next_in_seq(next_expected + 1).map_err(|e| SessionError::Transport(e.to_string()))?;
            let buffered_action = self.apply_in_sequence(&buffered, now)?;
            if !matches!(buffered_action, SessionAction::None) {
                action = buffered_action;
            }
            if let Some(until) = self.pending_resend_until {
                if next_expected >= until {
                    self.pending_resend_until = None;
                }
            }
        }

        Ok(action)
    }

    /// Dispatch a message that is already known to be in sequence (its
    /// sequence number has been consumed by the caller). Shared by the
    /// normal inbound path and by buffered-message replay.
    fn apply_in_sequence(&mut self, msg: &DecodedMessage, now: DateTime<Utc>) -> Result<SessionAction, SessionError> {
        match (self.state, msg.msg_type) {
            (SessionState::LogonSent, MsgType::Logon) => {
                let sender_ok = msg.fields.get(tags::TARGET_COMP_ID) == Some(self.config.sender_comp_id.as_str());
                let target_ok = msg.fields.get(tags::SENDER_COMP_ID) == Some(self.config.target_comp_id.as_str());
                if sender_ok && target_ok {
                    self.state = SessionState::Active;
                    Ok(SessionAction::None)
                } else {
                    self.state = SessionState::Disconnecting;
                    Err(SessionError::LogonRejected("comp id mismatch".to_string()))
                }
            }
            (SessionState::LogonSent, MsgType::Reject | MsgType::Logout) => {
                self.state = SessionState::Disconnecting;
                Err(SessionError::LogonRejected(
                    msg.fields.get(tags::TEXT).unwrap_or("counterparty rejected logon").to_string(),
                ))
            }
            (SessionState::Active, MsgType::Logout) => {
                let body = FixFieldMap::new();
                let wire = self.stamp_and_wrap(MsgType::Logout, &body, now)?;
                self.state = SessionState::Disconnecting;
                Ok(SessionAction::Send(wire))
            }
            (SessionState::LogoutSent, MsgType::Logout) => {
                self.state = SessionState::Disconnecting;
                Ok(SessionAction::None)
            }
            (SessionState::Active, MsgType::TestRequest) => {
                let mut body = FixFieldMap::new();
                if let Some(id) = msg.fields.get(tags::TEST_REQ_ID) {
                    body.push(tags::TEST_REQ_ID, id);
                }
                let wire = self.stamp_and_wrap(MsgType::Heartbeat, &body, now)?;
                Ok(SessionAction::Send(wire))
            }
            (SessionState::Active, MsgType::Heartbeat) => Ok(SessionAction::None),
            (SessionState::Active, MsgType::SequenceReset) => {
                if let Some(new_seq) = msg.fields.get(tags::NEW_SEQ_NO).and_then(|s| s.parse::<u64>().ok()) {
                    self.store.set_next_in_seq(new_seq).map_err(|e| SessionError::Transport(e.to_string()))?;
                }
                Ok(SessionAction::None)
            }
            _ => Ok(SessionAction::None),
        }
    }

    /// Heartbeat discipline (spec.md §4.6): emits a Heartbeat, TestRequest, or
    /// forces a disconnect depending on elapsed silence. Call on a timer tick.
    pub fn on_timer_tick(&mut self, now: DateTime<Utc>) -> Result<SessionAction, SessionError> {
        if self.state != SessionState::Active {
            return Ok(SessionAction::None);
        }

        let interval = self.config.heartbeat_interval_secs as i64;

        // Receive-silence checks take priority over the heartbeat-due send
        // below: a session that should be disconnected must not keep itself
        // alive by heartbeating on schedule.
        if let Some(last_received) = self.last_received_at {
            let silence = (now - last_received).num_seconds();
            let warn_threshold = (interval as f64 * 1.2) as i64;
            if silence >= warn_threshold + interval {
                self.state = SessionState::Disconnecting;
                return Err(SessionError::HeartbeatTimeout);
            }
            if silence >= warn_threshold && !self.test_request_outstanding {
                self.test_request_outstanding = true;
                let mut body = FixFieldMap::new();
                body.push(tags::TEST_REQ_ID, now.timestamp().to_string());
                let wire = self.stamp_and_wrap(MsgType::TestRequest, &body, now)?;
                return Ok(SessionAction::Send(wire));
            }
        }

        if let Some(last_sent) = self.last_sent_at {
            if (now - last_sent).num_seconds() >= interval {
                let body = FixFieldMap::new();
                let wire = self.stamp_and_wrap(MsgType::Heartbeat, &body, now)?;
                return Ok(SessionAction::Send(wire));
            }
        }

        Ok(SessionAction::None)
    }

    /// Outside a clean logout, the transport loop calls this on disconnect to
    /// get the reconnect delay (spec.md §4.6 "Reconnect").
    pub fn reconnect_action(&mut self) -> SessionAction {
        self.state = SessionState::Disconnected;
        SessionAction::ScheduleReconnect {
            after: Duration::from_secs(self.config.reconnect_interval_secs),
        }
    }
}

//! Bridges the Order Processor and the FIX Session (spec.md §4.8).

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::error::ConnectionError;
use crate::fix::{encode_new_order_single, encode_order_cancel_replace_request, encode_order_cancel_request, FixFieldMap, MsgType, Session, SessionState};
use crate::model::{ExecutionReport, OrderCancelReject, OrderCancelRequest, OrderReplaceRequest, OrderStatus, ProcessedOrder};
use crate::risk::RiskEngine;

/// Maps `client_order_id` to the live [`ProcessedOrder`], and drives fills
/// and cancel-reject updates into it and into the [`RiskEngine`]'s position.
///
/// `risk_engine` is `Arc`-shared with the [`crate::processor::OrderProcessor`]
/// that produced the orders passing through this gateway, rather than
/// borrowed, so the two can be owned independently by a binary's long-lived
/// tasks.
pub struct Gateway<'a> {
    session: &'a mut Session,
    risk_engine: Arc<RiskEngine>,
    outstanding_orders: DashMap<String, ProcessedOrder>,
}

impl<'a> Gateway<'a> {
    pub fn new(session: &'a mut Session, risk_engine: Arc<RiskEngine>) -> Self {
        Self {
            session,
            risk_engine,
            outstanding_orders: DashMap::new(),
        }
    }

    pub fn outstanding_order(&self, client_order_id: &str) -> Option<ProcessedOrder> {
        self.outstanding_orders.get(client_order_id).map(|e| e.clone())
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding_orders.len()
    }

    /// Send a NewOrderSingle for `processed` (spec.md §4.8 `send_order`).
    pub fn send_order(&mut self, processed: ProcessedOrder) -> Result<Vec<u8>, ConnectionError> {
        if self.session.state() != SessionState::Active {
            return Err(ConnectionError::NotActive {
                state: self.session.state(),
                client_order_id: processed.client_order_id.clone(),
            });
        }

        let client_order_id = processed.client_order_id.clone();
        self.outstanding_orders.insert(client_order_id.clone(), processed.clone());

        let body = encode_new_order_single(&processed, Utc::now());
        match self.session.send_app_message(MsgType::NewOrderSingle, &body, Utc::now()) {
            Ok(wire) => Ok(wire),
            Err(e) => {
                self.outstanding_orders.remove(&client_order_id);
                Err(ConnectionError::Session(e))
            }
        }
    }

    /// Send an OrderCancelRequest for a live order (SPEC_FULL §4.8 supplement
    /// to spec.md §4.8's `send_order`). Unlike `send_order`, the
    /// `outstanding_orders` entry is left untouched here — it is only
    /// updated once the broker's ExecutionReport or OrderCancelReject for
    /// this attempt arrives.
    pub fn send_cancel(&mut self, request: OrderCancelRequest) -> Result<Vec<u8>, ConnectionError> {
        if self.session.state() != SessionState::Active {
            return Err(ConnectionError::NotActive {
                state: self.session.state(),
                client_order_id: request.client_order_id.clone(),
            });
        }
        if !self.outstanding_orders.contains_key(&request.orig_client_order_id) {
            tracing::warn!(
                orig_client_order_id = %request.orig_client_order_id,
                "cancel request for an order this gateway has no outstanding record of"
            );
        }

        let body = encode_order_cancel_request(&request);
        self.session
            .send_app_message(MsgType::OrderCancelRequest, &body, Utc::now())
            .map_err(ConnectionError::Session)
    }

    /// Send an OrderCancelReplaceRequest for a live order (SPEC_FULL §4.8
    /// supplement), same contract as `send_cancel`.
    pub fn send_replace(&mut self, request: OrderReplaceRequest) -> Result<Vec<u8>, ConnectionError> {
        if self.session.state() != SessionState::Active {
            return Err(ConnectionError::NotActive {
                state: self.session.state(),
                client_order_id: request.client_order_id.clone(),
            });
        }
        if !self.outstanding_orders.contains_key(&request.orig_client_order_id) {
            tracing::warn!(
                orig_client_order_id = %request.orig_client_order_id,
                "replace request for an order this gateway has no outstanding record of"
            );
        }

        let body = encode_order_cancel_replace_request(&request);
        self.session
            .send_app_message(MsgType::OrderCancelReplaceRequest, &body, Utc::now())
            .map_err(ConnectionError::Session)
    }

    /// Apply an inbound ExecutionReport to the matching outstanding order and
    /// to the risk engine's position (spec.md §4.8).
    pub fn apply_execution_report(&mut self, report: &ExecutionReport) {
        let mut entry = match self.outstanding_orders.get_mut(&report.client_order_id) {
            Some(entry) => entry,
            None => {
                tracing::warn!(client_order_id = %report.client_order_id, "execution report for unknown order; discarding");
                return;
            }
        };

        if !report.quantities_reconcile() {
            tracing::warn!(
                client_order_id = %report.client_order_id,
                cum_qty = report.cum_qty,
                leaves_qty = report.leaves_qty,
                order_qty = report.order_qty,
                "execution report quantities do not reconcile"
            );
        }

        let now = report.transact_time;
        if let (Some(last_qty), Some(last_price)) = (report.last_qty, report.last_price) {
            if last_qty > 0 {
                if entry.apply_fill(last_qty, last_price, now).is_err() {
                    tracing::warn!(client_order_id = %report.client_order_id, "ignoring fill on terminal order");
                } else {
                    self.risk_engine.apply_fill(&entry.symbol, entry.side, last_qty);
                }
            }
        } else {
            let status = order_status_from_ord_status(report.ord_status);
            if entry.transition_status(status, now).is_err() {
                tracing::warn!(client_order_id = %report.client_order_id, "ignoring status transition on terminal order");
            }
        }

        let is_terminal = entry.is_terminal();
        drop(entry);
        if is_terminal {
            self.outstanding_orders.remove(&report.client_order_id);
        }
    }

    /// Record a rejected cancel/replace attempt without touching the
    /// original order's state (spec.md §4.8).
    pub fn apply_cancel_reject(&mut self, reject: &OrderCancelReject) {
        if !self.outstanding_orders.contains_key(&reject.client_order_id) {
            tracing::warn!(client_order_id = %reject.client_order_id, "cancel reject for unknown order; discarding");
            return;
        }
        tracing::info!(
            client_order_id = %reject.client_order_id,
            reason = ?reject.cxl_rej_reason,
            "cancel/replace request rejected by counterparty"
        );
    }
}

fn order_status_from_ord_status(ord_status: crate::model::OrdStatus) -> OrderStatus {
    use crate::model::OrdStatus;
    match ord_status {
        OrdStatus::New | OrdStatus::PendingNew => OrderStatus::New,
        OrdStatus::PartiallyFilled => OrderStatus::PartiallyFilled,
        OrdStatus::Filled => OrderStatus::Filled,
        OrdStatus::Canceled => OrderStatus::Canceled,
        OrdStatus::PendingCancel => OrderStatus::PendingCancel,
        OrdStatus::Rejected => OrderStatus::Rejected,
        OrdStatus::Expired => OrderStatus::Expired,
        OrdStatus::DoneForDay | OrdStatus::PendingReplace => OrderStatus::New,
    }
}

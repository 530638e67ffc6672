//! Single-socket TCP ingress listener (spec.md §4.7).
//!
//! Frames are newline-delimited UTF-8 JSON documents encoding an
//! [`OrderRequest`]. A bounded channel between the per-connection reader and
//! the processing loop models the high-water-mark backpressure: once full,
//! `try_send` drops the frame with no ack, matching the fire-and-forget
//! transport spec.md calls for.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::IngressConfig;
use crate::error::{ConnectionError, ProcessingError};
use crate::model::OrderRequest;

/// Counters for observability (SPEC_FULL §4.7 AMBIENT); consulted by nothing
/// internal to the listener's decision making.
#[derive(Debug, Default)]
pub struct IngressStats {
    pub frames_received: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub decode_errors: AtomicU64,
    pub processing_errors: AtomicU64,
    pub gateway_errors: AtomicU64,
}

/// The outcome of handing a decoded [`OrderRequest`] to the
/// processor-then-gateway pipeline, distinguishing which stage failed so the
/// right counter is bumped.
pub enum PipelineError {
    Processing(ProcessingError),
    Gateway(ConnectionError),
}

impl From<ProcessingError> for PipelineError {
    fn from(e: ProcessingError) -> Self {
        PipelineError::Processing(e)
    }
}

impl From<ConnectionError> for PipelineError {
    fn from(e: ConnectionError) -> Self {
        PipelineError::Gateway(e)
    }
}

/// Single-socket TCP listener. Owns no processing state — `on_request` is
/// the caller's processor → gateway pipeline, invoked once per decoded frame
/// on the same task that reads it (spec.md §5: "naturally serialized").
pub struct IngressListener {
    bind_address: String,
    high_water_mark: usize,
    stats: Arc<IngressStats>,
}

impl IngressListener {
    pub fn new(config: &IngressConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            high_water_mark: config.high_water_mark,
            stats: Arc::new(IngressStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<IngressStats> {
        self.stats.clone()
    }

    /// Accept connections forever, handling one at a time. `on_request` is
    /// called synchronously for each decoded frame; it is expected to run
    /// the validate → instrument → risk → gateway pipeline and report which
    /// stage failed, if any.
    pub async fn run(&self, mut on_request: impl FnMut(OrderRequest) -> Result<(), PipelineError>) -> io::Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        tracing::info!(bind_address = %self.bind_address, "ingress listener bound");

        loop {
            let (socket, peer) = listener.accept().await?;
            tracing::debug!(%peer, "ingress connection accepted");
            self.handle_connection(socket, &mut on_request).await;
        }
    }

    async fn handle_connection(&self, socket: tokio::net::TcpStream, on_request: &mut impl FnMut(OrderRequest) -> Result<(), PipelineError>) {
        let (tx, mut rx) = mpsc::channel::<String>(self.high_water_mark);
        let stats = self.stats.clone();

        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(socket).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        stats.frames_received.fetch_add(1, Ordering::Relaxed);
                        if tx.try_send(line).is_err() {
                            stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "ingress socket read error");
                        break;
                    }
                }
            }
        });

        while let Some(line) = rx.recv().await {
            self.process_frame(&line, on_request);
        }
        let _ = reader_task.await;
    }

    fn process_frame(&self, line: &str, on_request: &mut impl FnMut(OrderRequest) -> Result<(), PipelineError>) {
        let request: OrderRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                self.stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "failed to decode ingress frame");
                return;
            }
        };

        if let Err(err) = on_request(request) {
            match err {
                PipelineError::Processing(e) => {
                    self.stats.processing_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "order processing rejected request");
                }
                PipelineError::Gateway(e) => {
                    self.stats.gateway_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "gateway failed to send order");
                }
            }
        }
    }
}

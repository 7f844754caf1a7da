//! Single-flight delayed dispatcher.
//!
//! Submitted requests are queued; the first submission into an idle
//! scheduler arms one timer, later submissions ride along. When the timer
//! fires the dispatch watermark is moved one `request_interval` ahead, the
//! oldest queued request and every request compatible with it are merged
//! into one call, and that call races a cancellation guard of
//! `request_timeout`. Incompatible requests stay queued for the next call. Whatever happens, the guard is dropped and
//! the timer slot is released when the call settles.
//!
//! ```text
//!   submit            timer fires             call settles
//! Idle ──────▶ Armed ────────────▶ Dispatching ────────────▶ Idle
//!                ▲  submit: append   │  submit: append          │
//!                └───────────────────┴── re-arm if queue is non-empty
//! ```

use crate::batch::{BatchResponse, QueryRequest, QueuedItem, RequestQueue};
use crate::config::ClientConfig;
use crate::transport::{Transport, TransportError, WireCall};
use crate::{Error, Result};
use futures::FutureExt;
use reqwest::header::HeaderMap;
use serde::{Serialize, Serializer};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No timer armed.
    Idle,
    /// A timer is waiting to flush the queue.
    Armed,
    /// The timer fired and a call is in flight.
    Dispatching,
}

/// Point-in-time view of the scheduler (facts only).
///
/// Serializes with durations in whole milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    pub phase: Phase,
    /// Requests waiting for the next flush.
    pub pending: usize,
    /// How long the oldest pending request has been waiting.
    #[serde(rename = "oldest_pending_wait_ms", serialize_with = "opt_millis")]
    pub oldest_pending_wait: Option<Duration>,
    /// Time until the next dispatch may start, if that is in the future.
    #[serde(rename = "next_allowed_in_ms", serialize_with = "opt_millis")]
    pub next_allowed_in: Option<Duration>,
    /// Timers armed since creation.
    pub timers_armed: u64,
    /// Dispatches started since creation.
    pub dispatches: u64,
}

fn opt_millis<S: Serializer>(d: &Option<Duration>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&(d.as_millis() as u64)),
        None => s.serialize_none(),
    }
}

/// Handle for one submitted request; resolves with the outcome of the batch
/// that carried it.
#[derive(Debug)]
pub struct Ticket {
    request_id: String,
    rx: oneshot::Receiver<Result<BatchResponse>>,
}

impl Ticket {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Future for Ticket {
    type Output = Result<BatchResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(Error::Dropped)))
    }
}

struct Pending {
    query: QueryRequest,
    reply: oneshot::Sender<Result<BatchResponse>>,
}

struct State {
    queue: RequestQueue<Pending>,
    next_allowed_at: Option<Instant>,
    armed: Option<JoinHandle<()>>,
    phase: Phase,
    timers_armed: u64,
    dispatches: u64,
}

struct Shared {
    config: ClientConfig,
    headers: HeaderMap,
    transport: Arc<dyn Transport>,
    state: Mutex<State>,
}

/// Owns the pending queue, the dispatch watermark and the single timer.
///
/// Clones share the same queue and timer.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(config: ClientConfig, headers: HeaderMap, transport: Arc<dyn Transport>) -> Self {
        let state = Mutex::new(State {
            queue: RequestQueue::new(),
            next_allowed_at: None,
            armed: None,
            phase: Phase::Idle,
            timers_armed: 0,
            dispatches: 0,
        });
        Self {
            shared: Arc::new(Shared {
                config,
                headers,
                transport,
                state,
            }),
        }
    }

    /// Queue a request. Arms the timer if none is armed.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn submit(&self, query: QueryRequest) -> Ticket {
        let request_id = Uuid::new_v4().to_string();
        let (reply, rx) = oneshot::channel();

        let mut st = self.shared.state.lock().await;
        let pending = st
            .queue
            .push(QueuedItem::new(Pending { query, reply }, request_id.as_str()));

        if st.armed.is_none() {
            let now = Instant::now();
            let delay = match st.next_allowed_at {
                Some(at) if at > now => at - now,
                _ => self.shared.config.request_interval(),
            };
            self.shared.arm(&mut st, delay);
            debug!(
                request_id = request_id.as_str(),
                delay_ms = delay.as_millis() as u64,
                "armed dispatch timer"
            );
        } else {
            debug!(
                request_id = request_id.as_str(),
                pending,
                "queued behind armed timer"
            );
        }

        Ticket { request_id, rx }
    }

    /// Read-only view of the otherwise private queue, phase and watermark.
    ///
    /// Nothing here can change scheduling; it exists for logging and tests.
    pub async fn snapshot(&self) -> SchedulerSnapshot {
        let st = self.shared.state.lock().await;
        let now = Instant::now();
        SchedulerSnapshot {
            phase: st.phase,
            pending: st.queue.len(),
            oldest_pending_wait: st.queue.oldest_wait(),
            next_allowed_in: st
                .next_allowed_at
                .filter(|at| *at > now)
                .map(|at| at - now),
            timers_armed: st.timers_armed,
            dispatches: st.dispatches,
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl Shared {
    fn arm(self: &Arc<Self>, st: &mut State, delay: Duration) {
        let shared = Arc::clone(self);
        st.phase = Phase::Armed;
        st.timers_armed += 1;
        st.armed = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.dispatch().await;
        }));
    }

    async fn dispatch(self: Arc<Self>) {
        let items = {
            let mut st = self.state.lock().await;
            st.next_allowed_at = Some(Instant::now() + self.config.request_interval());
            st.phase = Phase::Dispatching;
            st.dispatches += 1;
            match st.queue.front().map(|p| p.query.clone()) {
                Some(first) => {
                    let items = st.queue.drain_matching(|p| p.query.can_merge_with(&first));
                    if !st.queue.is_empty() {
                        debug!(
                            deferred = st.queue.len(),
                            "requests with different single-value parameters wait for the next call"
                        );
                    }
                    items
                }
                None => Vec::new(),
            }
        };

        if !items.is_empty() {
            self.send_batch(items).await;
        }

        let mut st = self.state.lock().await;
        st.armed = None;
        st.phase = Phase::Idle;
        if !st.queue.is_empty() {
            let delay = st
                .next_allowed_at
                .map(|at| at.saturating_duration_since(Instant::now()))
                .unwrap_or_default();
            debug!(
                pending = st.queue.len(),
                delay_ms = delay.as_millis() as u64,
                "re-arming for requests queued during dispatch"
            );
            self.arm(&mut st, delay);
        }
    }

    async fn send_batch(&self, items: Vec<QueuedItem<Pending>>) {
        let batch_id = Uuid::new_v4().to_string();
        let size = items.len();
        let wait_ms = items
            .first()
            .map(|i| i.enqueued_at.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let merged = QueryRequest::merge(items.iter().map(|i| &i.data.query));
        let call = WireCall::new(self.config.endpoint(), &merged, self.headers.clone());
        let timeout = self.config.request_timeout();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let outcome = {
            let call_fut = AssertUnwindSafe(self.transport.send(&call, cancel.clone())).catch_unwind();
            let guard = tokio::time::sleep(timeout);
            tokio::select! {
                settled = call_fut => settled.unwrap_or_else(|_| {
                    Err(Error::Transport(TransportError::Other("transport panicked".to_string())))
                }),
                _ = guard => {
                    cancel.cancel();
                    Err(Error::Timeout { after: timeout })
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = match outcome {
            Ok(body) => {
                info!(
                    batch_id = batch_id.as_str(),
                    size,
                    wait_ms,
                    duration_ms,
                    "wiki query dispatched"
                );
                Ok(BatchResponse::new(batch_id, size, Arc::new(body)))
            }
            Err(e) => {
                warn!(
                    batch_id = batch_id.as_str(),
                    size,
                    wait_ms,
                    duration_ms,
                    error = %e,
                    "wiki query failed"
                );
                Err(e)
            }
        };

        for item in items {
            if item.data.reply.send(outcome.clone()).is_err() {
                debug!(
                    request_id = item.request_id.as_str(),
                    "ticket dropped before batch settled"
                );
            }
        }
    }
}

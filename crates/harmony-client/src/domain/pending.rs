//! Pending-request registry.
//!
//! Holds outstanding requests in insertion order and pairs each inbound
//! stanza with at most one of them.
//!
//! Flow:
//! 1. The façade calls `register_with_id()` and gets a [`PendingReply`]
//! 2. The façade sends the outbound stanza carrying the same id
//! 3. The dispatcher calls `dispatch()` for every inbound stanza
//! 4. The first matching entry is removed, its payload decoded and its slot resolved
//! 5. The caller awaits the `PendingReply`
//!
//! Entries are scanned linearly. The number of in-flight hub requests is
//! small, and custom matchers rule out keyed lookup anyway.

use crate::domain::codec::{decode, Encoding, Payload};
use crate::domain::correlation::CorrelationId;
use crate::domain::error::{HubError, HubResult};
use crate::domain::matcher::Matcher;
use parking_lot::Mutex;
use shared_types::{names, Stanza};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

type Slot = oneshot::Sender<HubResult<Payload>>;

/// An outstanding request waiting for its reply
struct PendingRequest {
    id: CorrelationId,
    matcher: Matcher,
    encoding: Encoding,
    /// Command name (for logging)
    command: String,
    created_at: Instant,
    timeout: Option<Duration>,
    slot: Slot,
}

impl PendingRequest {
    fn is_expired(&self, now: Instant) -> bool {
        self.timeout
            .is_some_and(|timeout| now.duration_since(self.created_at) > timeout)
    }
}

/// Statistics for the pending-request registry
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Requests registered
    pub registered: AtomicU64,
    /// Requests resolved with a decoded payload
    pub resolved: AtomicU64,
    /// Requests rejected on decode failure or close
    pub rejected: AtomicU64,
    /// Requests rejected by the timeout sweep
    pub timeouts: AtomicU64,
    /// Requests removed after a send failure
    pub discarded: AtomicU64,
    /// Matches whose caller had already dropped its reply handle
    pub orphaned: AtomicU64,
    /// Inbound stanzas that matched nothing
    pub unmatched: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub registered: u64,
    pub resolved: u64,
    pub rejected: u64,
    pub timeouts: u64,
    pub discarded: u64,
    pub orphaned: u64,
    pub unmatched: u64,
}

impl PendingStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            orphaned: self.orphaned.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
        }
    }
}

/// What a single `dispatch()` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The entry resolved with a decoded payload, if any.
    pub resolved: Option<CorrelationId>,
    /// Entries that matched but whose payload failed to decode.
    pub rejected: Vec<CorrelationId>,
}

impl DispatchOutcome {
    /// True when no entry matched.
    pub fn is_unmatched(&self) -> bool {
        self.resolved.is_none() && self.rejected.is_empty()
    }
}

/// Handle to the eventual result of a pending request.
///
/// Dropping it abandons the request: a later match is a silent no-op.
#[derive(Debug)]
#[must_use = "a pending reply does nothing unless awaited"]
pub struct PendingReply {
    id: CorrelationId,
    receiver: oneshot::Receiver<HubResult<Payload>>,
}

impl PendingReply {
    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

impl Future for PendingReply {
    type Output = HubResult<Payload>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped slot means the registry went away with the entry still in it.
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(HubError::Closed)))
    }
}

/// Ordered registry of outstanding requests.
pub struct PendingRequestRegistry {
    entries: Mutex<Vec<PendingRequest>>,
    /// Applied when `register` is given no explicit timeout
    default_timeout: Option<Duration>,
    stats: Arc<PendingStats>,
}

impl PendingRequestRegistry {
    pub fn new(default_timeout: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a request under a fresh correlation id.
    pub fn register(
        &self,
        matcher: Matcher,
        encoding: Encoding,
        command: &str,
        timeout: Option<Duration>,
    ) -> (CorrelationId, PendingReply) {
        let id = CorrelationId::new();
        let reply = self.register_with_id(id, matcher, encoding, command, timeout);
        (id, reply)
    }

    /// Register a request under a caller-chosen correlation id.
    pub fn register_with_id(
        &self,
        id: CorrelationId,
        matcher: Matcher,
        encoding: Encoding,
        command: &str,
        timeout: Option<Duration>,
    ) -> PendingReply {
        let (slot, receiver) = oneshot::channel();

        debug!(
            correlation_id = %id,
            command = command,
            matcher = matcher.kind(),
            %encoding,
            "Registered pending request"
        );

        self.entries.lock().push(PendingRequest {
            id,
            matcher,
            encoding,
            command: command.to_string(),
            created_at: Instant::now(),
            timeout: timeout.or(self.default_timeout),
            slot,
        });
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        PendingReply { id, receiver }
    }

    /// Run every pending matcher against an inbound stanza, in insertion order.
    ///
    /// The first entry that matches and decodes is resolved and ends the scan.
    /// An entry that matches but fails to decode is rejected and the scan
    /// moves on to the remaining entries.
    pub fn dispatch(&self, stanza: &Stanza) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let mut entries = self.entries.lock();
        let mut index = 0;

        while index < entries.len() {
            let entry = &entries[index];
            match entry.matcher.matches(stanza) {
                Ok(true) => {}
                Ok(false) => {
                    index += 1;
                    continue;
                }
                Err(e) => {
                    warn!(
                        correlation_id = %entry.id,
                        command = entry.command,
                        error = %e,
                        "Match predicate failed, treating as no match"
                    );
                    index += 1;
                    continue;
                }
            }

            let entry = entries.remove(index);
            let raw = reply_payload(stanza);

            match decode(raw, entry.encoding) {
                Ok(payload) => {
                    debug!(
                        correlation_id = %entry.id,
                        command = entry.command,
                        response_time_ms = entry.created_at.elapsed().as_millis() as u64,
                        "Resolved pending request"
                    );
                    self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                    self.fill(entry.id, entry.slot, Ok(payload));
                    outcome.resolved = Some(entry.id);
                    break;
                }
                Err(e) => {
                    warn!(
                        correlation_id = %entry.id,
                        command = entry.command,
                        error = %e,
                        "Reply payload failed to decode"
                    );
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    self.fill(entry.id, entry.slot, Err(e));
                    outcome.rejected.push(entry.id);
                }
            }
        }

        if outcome.is_unmatched() {
            self.stats.unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(stanza = %stanza, "Inbound stanza matched no pending request");
        }

        outcome
    }

    fn fill(&self, id: CorrelationId, slot: Slot, result: HubResult<Payload>) {
        if slot.send(result).is_err() {
            self.stats.orphaned.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %id, "Pending reply receiver dropped");
        }
    }

    /// Remove an entry without resolving it. Used when the send failed.
    pub(crate) fn discard(&self, id: &CorrelationId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|entry| entry.id == *id) {
            Some(index) => {
                entries.remove(index);
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Reject and remove entries whose timeout has elapsed.
    ///
    /// Returns the number of requests removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<PendingRequest> = {
            let mut entries = self.entries.lock();
            let (expired, kept) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|entry| entry.is_expired(now));
            *entries = kept;
            expired
        };

        for entry in &expired {
            let elapsed = now.duration_since(entry.created_at);
            warn!(
                correlation_id = %entry.id,
                command = entry.command,
                elapsed_ms = elapsed.as_millis() as u64,
                "Removing expired pending request"
            );
        }

        let removed = expired.len();
        for entry in expired {
            let err = HubError::Timeout {
                command: entry.command,
                elapsed_ms: now.duration_since(entry.created_at).as_millis() as u64,
            };
            self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
            self.fill(entry.id, entry.slot, Err(err));
        }
        removed
    }

    /// Drain the registry, rejecting every entry with `err`.
    pub fn reject_all(&self, err: HubError) -> usize {
        let drained = std::mem::take(&mut *self.entries.lock());
        let count = drained.len();
        for entry in drained {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            self.fill(entry.id, entry.slot, Err(err.clone()));
        }
        if count > 0 {
            debug!(count, error = %err, "Rejected all pending requests");
        }
        count
    }

    /// Number of outstanding requests
    pub fn pending_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.entries.lock().iter().any(|entry| entry.id == *id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Payload text of a reply (`oa` child) or pushed event (`event` child).
fn reply_payload(stanza: &Stanza) -> &str {
    stanza
        .child_text(names::OA)
        .or_else(|| stanza.child_text(names::EVENT))
        .unwrap_or_default()
}

/// Background task rejecting expired requests
pub async fn cleanup_task(registry: Arc<PendingRequestRegistry>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        let removed = registry.remove_expired();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired pending requests");
        }
    }
}

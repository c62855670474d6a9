// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Parking for service handlers that answer `GoodCompletesAsynchronously`
//! (`SPEC_FULL.md` §4.8): `Read`, `Write` and `Call` may all defer their
//! result past the handler's return, to be filled in later either by
//! userland application code (a local, API-initiated completion) or by
//! another async task within this crate.
//!
//! The wire contract describes a callback fired on the next `EventLoop`
//! tick; this crate is built on `tokio` throughout, so the same effect is
//! had with a `tokio::sync::oneshot` channel — the task awaiting the
//! receiver is woken, not run in-line from [`AsyncOperations::set_result`],
//! which gives the "never synchronously" guarantee for free.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use opcua_core::sync::Mutex;
use opcua_types::{DataValue, StatusCode, Variant};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Which service kind a parked operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkedKind {
    /// A `Read` service's per-value result.
    Read,
    /// A `Write` service's per-value result.
    Write,
    /// A `Call` service's per-call result.
    Call,
}

/// Identifies one parked operation. Opaque to callers beyond equality and
/// the value handed back from [`AsyncOperations::park`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsyncOperationId(u64);

/// What a parked operation resolves to, shaped by its [`ParkedKind`].
#[derive(Debug, Clone)]
pub enum AsyncOutcome {
    /// `Write` resolved with a status only.
    Write(StatusCode),
    /// `Read` resolved with a value.
    Read(DataValue),
    /// `Call` resolved with a status and its output arguments.
    Call(StatusCode, Vec<Variant>),
}

impl AsyncOutcome {
    /// The outcome for an expired, cancelled, or otherwise abandoned operation.
    pub fn cancelled(kind: ParkedKind, status: StatusCode) -> Self {
        match kind {
            ParkedKind::Write => AsyncOutcome::Write(status),
            ParkedKind::Read => AsyncOutcome::Read(DataValue::new_error(status)),
            ParkedKind::Call => AsyncOutcome::Call(status, Vec::new()),
        }
    }
}

struct Entry {
    kind: ParkedKind,
    deadline: Instant,
    sender: Option<oneshot::Sender<AsyncOutcome>>,
}

/// The registry of in-flight parked operations for one server. Operations
/// are removed from the registry the moment they resolve, cancel, or expire
/// — `set_result`/`cancel` firing exactly once each is the registry's job,
/// not the caller's.
pub struct AsyncOperations {
    next_id: AtomicU64,
    pending: Mutex<HashMap<AsyncOperationId, Entry>>,
}

impl Default for AsyncOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncOperations {
    /// An empty registry.
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), pending: Mutex::new(HashMap::new()) }
    }

    /// Park an operation of `kind`, due to time out at `deadline`. Returns its id (to hand back
    /// to userland as `userContext`, and to later `set_result`/`cancel`) and a receiver that
    /// resolves exactly once.
    pub fn park(&self, kind: ParkedKind, deadline: Instant) -> (AsyncOperationId, oneshot::Receiver<AsyncOutcome>) {
        let id = AsyncOperationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, Entry { kind, deadline, sender: Some(tx) });
        (id, rx)
    }

    /// Resolve a parked operation with its result. Returns `false` if `id` is unknown (already
    /// resolved, cancelled, or never parked) — callers should treat that as a no-op, not an
    /// error, since a late `set_result` racing a timeout is expected.
    pub fn set_result(&self, id: AsyncOperationId, outcome: AsyncOutcome) -> bool {
        let sender = self.pending.lock().remove(&id).and_then(|e| e.sender);
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Cancel a single parked operation immediately, e.g. because its owning session closed.
    pub fn cancel(&self, id: AsyncOperationId, status: StatusCode) {
        if let Some(entry) = self.pending.lock().remove(&id) {
            if let Some(sender) = entry.sender {
                let _ = sender.send(AsyncOutcome::cancelled(entry.kind, status));
            }
        }
    }

    /// Cancel every operation belonging to the ids in `ids`, e.g. the set owned by a session
    /// that just closed.
    pub fn cancel_many(&self, ids: &[AsyncOperationId], status: StatusCode) {
        for &id in ids {
            self.cancel(id, status);
        }
    }

    /// Cancel every operation whose deadline is at or before `now` with `BadTimeout`. Called
    /// once per `EventLoop` tick.
    pub fn expire(&self, now: Instant) {
        let expired: Vec<AsyncOperationId> =
            self.pending.lock().iter().filter(|(_, e)| e.deadline <= now).map(|(id, _)| *id).collect();
        self.cancel_many(&expired, StatusCode::BadTimeout);
    }

    /// Number of operations currently parked.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// `true` if no operations are currently parked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn set_result_resolves_the_receiver() {
        let ops = AsyncOperations::new();
        let (id, rx) = ops.park(ParkedKind::Call, Instant::now() + Duration::from_secs(5));
        assert!(ops.set_result(id, AsyncOutcome::Call(StatusCode::Good, vec![Variant::Int32(17)])));
        match rx.await.unwrap() {
            AsyncOutcome::Call(status, outputs) => {
                assert_eq!(status, StatusCode::Good);
                assert_eq!(outputs, vec![Variant::Int32(17)]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_result_on_unknown_id_is_a_harmless_no_op() {
        let ops = AsyncOperations::new();
        let bogus = ops.park(ParkedKind::Write, Instant::now() + Duration::from_secs(5)).0;
        ops.cancel(bogus, StatusCode::BadTimeout);
        assert!(!ops.set_result(bogus, AsyncOutcome::Write(StatusCode::Good)));
    }

    #[tokio::test]
    async fn cancel_fires_the_receiver_with_the_given_status() {
        let ops = AsyncOperations::new();
        let (id, rx) = ops.park(ParkedKind::Write, Instant::now() + Duration::from_secs(5));
        ops.cancel(id, StatusCode::BadSessionClosed);
        match rx.await.unwrap() {
            AsyncOutcome::Write(status) => assert_eq!(status, StatusCode::BadSessionClosed),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn expire_cancels_only_past_deadline_operations() {
        let ops = AsyncOperations::new();
        let now = Instant::now();
        let (expired_id, expired_rx) = ops.park(ParkedKind::Call, now);
        let (_live_id, _live_rx) = ops.park(ParkedKind::Call, now + Duration::from_secs(60));

        ops.expire(now);

        assert_eq!(ops.len(), 1);
        match expired_rx.await.unwrap() {
            AsyncOutcome::Call(status, _) => assert_eq!(status, StatusCode::BadTimeout),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let _ = expired_id;
    }
}

// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`EventLoop`]: a single-threaded cooperative scheduler for timed and
//! repeating callbacks.
//!
//! The contract is the classic hand-rolled reactor one (`add_timed`,
//! `add_repeated`, `change_interval`, `remove`, `iterate`), but the
//! implementation is a thin facade over `tokio::time` rather than a
//! hand-rolled socket poller: `iterate` sleeps until the next due timer (or
//! returns immediately if one is already due) and runs everything that has
//! come due. This lets tests drive it deterministically with explicit
//! `iterate()` calls while a production `tokio::select!` loop can await the
//! `next_deadline` it reports between ticks.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tokio::time::{Duration, Instant};

use crate::sync::Mutex;

/// Identifies a scheduled callback, returned by `add_timed`/`add_repeated` and accepted by
/// `remove`/`change_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type Callback = Box<dyn FnMut() + Send>;

struct Timer {
    id: TimerId,
    due: Instant,
    repeat: Option<Duration>,
    callback: Callback,
    removed: bool,
}

struct Entry {
    due: Instant,
    id: TimerId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due)
    }
}

struct Inner {
    next_id: u64,
    timers: std::collections::HashMap<TimerId, Timer>,
    heap: BinaryHeap<Reverse<Entry>>,
}

/// A single-threaded cooperative scheduler: register timed and repeating callbacks, then drive
/// them forward with [`EventLoop::iterate`].
pub struct EventLoop {
    inner: Mutex<Inner>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// An empty event loop with no timers registered.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { next_id: 1, timers: std::collections::HashMap::new(), heap: BinaryHeap::new() }),
        }
    }

    /// Schedule `callback` to run once at `when`.
    pub fn add_timed(&self, when: Instant, callback: impl FnMut() + Send + 'static) -> TimerId {
        self.schedule(when, None, Box::new(callback))
    }

    /// Schedule `callback` to run every `interval`, starting no later than `now + interval`.
    /// `interval` must be at least 1ms.
    pub fn add_repeated(&self, interval: Duration, callback: impl FnMut() + Send + 'static) -> TimerId {
        let interval = interval.max(Duration::from_millis(1));
        self.schedule(Instant::now() + interval, Some(interval), Box::new(callback))
    }

    fn schedule(&self, due: Instant, repeat: Option<Duration>, callback: Callback) -> TimerId {
        let mut inner = self.inner.lock();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.heap.push(Reverse(Entry { due, id }));
        inner.timers.insert(id, Timer { id, due, repeat, callback, removed: false });
        id
    }

    /// Change a repeating timer's interval. Takes effect for the next firing; does not
    /// retroactively move an already-due firing.
    pub fn change_interval(&self, id: TimerId, interval: Duration) {
        let mut inner = self.inner.lock();
        if let Some(timer) = inner.timers.get_mut(&id) {
            timer.repeat = Some(interval.max(Duration::from_millis(1)));
        }
    }

    /// Cancel a timer. Idempotent: removing an unknown or already-removed id is a no-op.
    /// Once this returns, the callback is guaranteed not to run again.
    pub fn remove(&self, id: TimerId) {
        let mut inner = self.inner.lock();
        if let Some(timer) = inner.timers.get_mut(&id) {
            timer.removed = true;
        }
        inner.timers.remove(&id);
    }

    /// Run every timer due by now. If `wait_for_io` and nothing is due yet, sleeps until the
    /// nearest deadline first. Returns how long the caller may wait before calling `iterate`
    /// again, or `None` if no timers remain.
    pub async fn iterate(&self, wait_for_io: bool) -> Option<Duration> {
        if wait_for_io {
            let next_due = { self.inner.lock().heap.peek().map(|Reverse(e)| e.due) };
            if let Some(due) = next_due {
                tokio::time::sleep_until(due).await;
            }
        }

        let now = Instant::now();
        loop {
            let due_id = {
                let mut inner = self.inner.lock();
                match inner.heap.peek() {
                    Some(Reverse(entry)) if entry.due <= now => {
                        let Reverse(entry) = inner.heap.pop().unwrap();
                        Some(entry.id)
                    }
                    _ => None,
                }
            };
            let Some(id) = due_id else { break };

            // Take the callback out while running it so callers can call back into the
            // event loop (e.g. `remove` another timer) from inside it without deadlocking.
            let mut callback = {
                let mut inner = self.inner.lock();
                match inner.timers.get_mut(&id) {
                    Some(timer) if !timer.removed => std::mem::replace(&mut timer.callback, Box::new(|| {})),
                    _ => continue,
                }
            };
            callback();

            let mut inner = self.inner.lock();
            if let Some(timer) = inner.timers.get_mut(&id) {
                if timer.removed {
                    inner.timers.remove(&id);
                } else if let Some(interval) = timer.repeat {
                    timer.callback = callback;
                    timer.due = now + interval;
                    let due = timer.due;
                    inner.heap.push(Reverse(Entry { due, id }));
                } else {
                    inner.timers.remove(&id);
                }
            }
        }

        let inner = self.inner.lock();
        inner.heap.peek().map(|Reverse(e)| e.due.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn one_shot_timer_fires_once() {
        let event_loop = EventLoop::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        event_loop.add_timed(Instant::now(), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        event_loop.iterate(false).await;
        event_loop.iterate(false).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_timer_fires_again_after_interval() {
        let event_loop = EventLoop::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        event_loop.add_repeated(Duration::from_millis(1), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        event_loop.iterate(false).await;
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn removed_timer_never_fires() {
        let event_loop = EventLoop::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = event_loop.add_timed(Instant::now() + Duration::from_millis(20), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        event_loop.remove(id);
        tokio::time::sleep(Duration::from_millis(30)).await;
        event_loop.iterate(false).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}

//! In-process counter store.

use super::service::{CounterResult, CounterSnapshot, CounterStore, WindowHit};
use crate::infrastructure::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    started_at: Instant,
    length: Duration,
}

impl Window {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.length
    }

    fn reset_after(&self, now: Instant) -> Duration {
        self.length
            .saturating_sub(now.duration_since(self.started_at))
    }
}

/// Counter store living inside the process.
///
/// Used when Redis is not configured and as the fallback while Redis is
/// unreachable. Counts are not shared between instances and vanish on restart.
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    /// Creates a store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store driven by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        debug!("Using in-process counter store");
        Self {
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Removes every window that has run out and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now));
        before - windows.len()
    }

    /// Number of tracked keys, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CounterResult<WindowHit> {
        let now = self.clock.now();
        let mut windows = self.lock();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
            length: window,
        });

        if entry.is_expired(now) {
            *entry = Window {
                count: 0,
                started_at: now,
                length: window,
            };
        }

        let allowed = entry.count < limit;
        if allowed {
            entry.count += 1;
        }

        Ok(WindowHit {
            count: entry.count,
            allowed,
            reset_after: entry.reset_after(now),
        })
    }

    async fn peek(&self, key: &str) -> CounterResult<Option<CounterSnapshot>> {
        let now = self.clock.now();
        let windows = self.lock();

        Ok(windows
            .get(key)
            .filter(|window| !window.is_expired(now))
            .map(|window| CounterSnapshot {
                count: window.count,
                reset_after: window.reset_after(now),
            }))
    }

    async fn reset(&self, key: &str) -> CounterResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

//! Counter store trait and error types.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a counter backend.
///
/// The rate limiter never surfaces these to clients; any of them switches
/// the limiter to its in-process fallback.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Counter store connection error: {0}")]
    Connection(String),

    #[error("Counter store operation error: {0}")]
    Operation(String),

    #[error("Counter store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for counter operations.
pub type CounterResult<T> = Result<T, CounterError>;

/// Outcome of one hit against a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Counter value after this hit.
    pub count: u64,
    /// `false` when the window was already full. The counter is left untouched then.
    pub allowed: bool,
    /// Time until the window resets.
    pub reset_after: Duration,
}

/// Read-only view of a counter, used by the admin CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub count: u64,
    pub reset_after: Duration,
}

/// Atomic fixed-window counter keyed by string.
///
/// `hit` must check the ceiling and increment in one atomic step, and must
/// start a new window (with `window` as its lifetime) when the key is absent
/// or expired.
///
/// # Implementations
///
/// - [`crate::infrastructure::counter::RedisCounterStore`] - Lua script over a shared Redis
/// - [`crate::infrastructure::counter::MemoryCounterStore`] - mutex-guarded map
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Counts one request against `key` unless `limit` is already reached.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError`] when the backend cannot be reached.
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CounterResult<WindowHit>;

    /// Returns the live counter for `key`, or `None` if no window is open.
    async fn peek(&self, key: &str) -> CounterResult<Option<CounterSnapshot>>;

    /// Drops the counter for `key`.
    async fn reset(&self, key: &str) -> CounterResult<()>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}

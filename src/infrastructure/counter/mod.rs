//! Fixed-window request counters for rate limiting.
//!
//! Provides a [`CounterStore`] trait with two implementations:
//! - [`RedisCounterStore`] - shared across every server instance
//! - [`MemoryCounterStore`] - in-process fallback, lost on restart

mod memory_store;
mod redis_store;
mod service;

pub use memory_store::MemoryCounterStore;
pub use redis_store::RedisCounterStore;
pub use service::{CounterError, CounterResult, CounterSnapshot, CounterStore, WindowHit};

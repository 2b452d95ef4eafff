//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`clock`] - Time source for the in-process counter store
//! - [`counter`] - Rate limit counter stores (Redis and in-process)
//! - [`persistence`] - PostgreSQL repository implementations

pub mod clock;
pub mod counter;
pub mod persistence;

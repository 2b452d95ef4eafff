//! Domain layer containing business entities and contracts.
//!
//! It defines entities, repository interfaces, and the rate limit vocabulary
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Users and waste listings
//! - [`repositories`] - Data access trait definitions
//! - [`rate_limit`] - Tiers, rules and limiter verdicts
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod rate_limit;
pub mod repositories;

//! Repository trait definitions for the domain layer.
//!
//! Traits define the data contract; PostgreSQL implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - Users, credentials and the user directory lookup used by auth
//! - [`WasteRepository`] - Waste listing CRUD and search

pub mod user_repository;
pub mod waste_repository;

pub use user_repository::UserRepository;
pub use waste_repository::WasteRepository;

#[cfg(test)]
pub use user_repository::MockUserRepository;
#[cfg(test)]
pub use waste_repository::MockWasteRepository;

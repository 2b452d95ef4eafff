//! PostgreSQL repository implementations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! `FromRow` row structs; enum columns are stored as lowercase text.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Users, credentials and login bookkeeping
//! - [`PgWasteRepository`] - Waste listings and search

pub mod pg_user_repository;
pub mod pg_waste_repository;

pub use pg_user_repository::PgUserRepository;
pub use pg_waste_repository::PgWasteRepository;

//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`User`] - A marketplace participant (producer, collector or recycler)
//! - [`WasteListing`] - A batch of reusable material offered by a producer
//!
//! Creation and update inputs are separate structs (`NewUser`, `ProfileUpdate`,
//! `NewWasteListing`, `StatusChange`).

pub mod user;
pub mod waste;

pub use user::{NewUser, ProfileUpdate, Role, User};
pub use waste::{
    Availability, NewWasteListing, StatusChange, WasteListing, WasteSearch, WasteStatus,
    WasteType,
};

//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod users;
pub mod waste;

pub use health::health_handler;
pub use users::{login_handler, me_handler, register_handler, update_profile_handler};
pub use waste::{
    create_waste_handler, get_waste_handler, search_waste_handler, update_status_handler,
    user_waste_handler,
};

//! Business logic services for the application layer.

pub mod auth_service;
pub mod rate_limiter;
pub mod user_service;
pub mod waste_service;

pub use auth_service::{AuthService, AuthenticatedUser, Claims, JwtError};
pub use rate_limiter::{RateLimiter, StorePolicy};
pub use user_service::{RegisterInput, Session, UserService};
pub use waste_service::WasteService;

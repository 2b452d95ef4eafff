//! Account registration, login and profile management.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::application::services::auth_service::AuthService;
use crate::domain::entities::{NewUser, ProfileUpdate, Role, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub role: Role,
}

/// A user together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            auth,
            bcrypt_cost,
        }
    }

    /// Creates an account and signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the email is already registered.
    /// Returns [`AppError::Internal`] on hashing, signing or database errors.
    pub async fn register(&self, input: RegisterInput) -> Result<Session, AppError> {
        let email = input.email.trim().to_lowercase();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("Email already registered"));
        }

        let password_hash = hash_password(input.password, self.bcrypt_cost).await?;

        let user = self
            .users
            .create(NewUser {
                name: input.name.trim().to_string(),
                email,
                password_hash,
                company: input.company,
                location: input.location,
                role: input.role,
            })
            .await?;

        info!(user_id = user.id, role = %user.role, "User registered");

        self.session_for(user)
    }

    /// Verifies credentials and issues a token.
    ///
    /// A wrong password increments the user's failed login counter; success
    /// resets it and stamps `last_login`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCredentials`] for an unknown email or a
    /// wrong password, without telling the two apart.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = email.trim().to_lowercase();

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            self.users.record_failed_login(user.id).await?;
            debug!(user_id = user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        self.users.record_successful_login(user.id).await?;
        user.login_attempts = 0;
        user.last_login = Some(Utc::now());

        self.session_for(user)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user no longer exists.
    pub async fn current_user(&self, id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Applies a partial profile update. An empty update returns the user unchanged.
    pub async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, AppError> {
        if update.is_empty() {
            return self.current_user(id).await;
        }

        self.users
            .update_profile(id, update)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    fn session_for(&self, user: User) -> Result<Session, AppError> {
        let token = self
            .auth
            .issue_token(&user)
            .map_err(|e| AppError::internal(e.to_string()))?;
        Ok(Session { user, token })
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password check task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password check failed: {e}")))
}

//! DTOs for user endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::application::services::RegisterInput;
use crate::domain::entities::{ProfileUpdate, Role, User};

/// Requires at least one uppercase letter, one lowercase letter, one digit
/// and one character that is none of those.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let checks: [(fn(&char) -> bool, &'static str); 4] = [
        (
            char::is_ascii_uppercase,
            "Password must contain at least one uppercase letter",
        ),
        (
            char::is_ascii_lowercase,
            "Password must contain at least one lowercase letter",
        ),
        (
            char::is_ascii_digit,
            "Password must contain at least one number",
        ),
        (
            |c: &char| !c.is_ascii_alphanumeric(),
            "Password must contain at least one special character",
        ),
    ];

    for (check, message) in checks {
        if !password.chars().any(|c| check(&c)) {
            return Err(ValidationError::new("password_strength").with_message(message.into()));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,

    pub company: Option<String>,
    pub location: Option<String>,
    pub role: Role,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            company: req.company,
            location: req.location,
            role: req.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            company: req.company,
            location: req.location,
        }
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub role: Role,
    pub impact_score: i64,
    pub total_waste_listed: i64,
    pub badges: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            company: user.company,
            location: user.location,
            role: user.role,
            impact_score: user.impact_score,
            total_waste_listed: user.total_waste_listed,
            badges: user.badges,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Str0ng!pass").is_ok());

        for (weak, expected) in [
            ("str0ng!pass", "uppercase"),
            ("STR0NG!PASS", "lowercase"),
            ("Strong!pass", "number"),
            ("Str0ngpass", "special"),
        ] {
            let err = validate_password_strength(weak).unwrap_err();
            assert!(
                err.message.unwrap().contains(expected),
                "{weak} should fail the {expected} check"
            );
        }
    }

    #[test]
    fn test_register_request_validation() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "A",
            "email": "not-an-email",
            "password": "short",
            "role": "collector"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<RegisterRequest>(serde_json::json!({
            "name": "Ann",
            "email": "ann@example.com",
            "password": "Str0ng!pass",
            "role": "admin"
        }));
        assert!(result.is_err());
    }
}

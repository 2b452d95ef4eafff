//! User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Producer,
    Collector,
    Recycler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Collector => "collector",
            Role::Recycler => "recycler",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "producer" => Some(Role::Producer),
            "collector" => Some(Role::Collector),
            "recycler" => Some(Role::Recycler),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user.
///
/// `password_hash` is a bcrypt hash and never leaves the service layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub role: Role,
    pub impact_score: i64,
    pub total_waste_listed: i64,
    pub badges: Vec<String>,
    pub login_attempts: i32,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    /// Already lowercased.
    pub email: String,
    pub password_hash: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub role: Role,
}

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.company.is_none() && self.location.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Producer, Role::Collector, Role::Recycler] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        let json = serde_json::to_string(&Role::Recycler).unwrap();
        assert_eq!(json, "\"recycler\"");
    }

    #[test]
    fn test_profile_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            company: Some("Acme".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}

//! User entity and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::error::AppError;

/// Authorization role. Serialized in kebab-case (`lead-guide`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "guide" => Ok(Role::Guide),
            "lead-guide" => Ok(Role::LeadGuide),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::bad_request(
                "Invalid input data. Role is either: user, guide, lead-guide, admin",
                json!({ "role": other }),
            )),
        }
    }
}

/// A registered user.
///
/// Credentials and account state never leave the process: they are skipped
/// during serialization.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role: Role,
    #[serde(skip)]
    pub password: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub password_reset_token: Option<String>,
    #[serde(skip)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub active: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub revision: i32,
}

impl User {
    /// Returns true if the password changed after a token issued at `issued_at`
    /// (seconds since the epoch).
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| changed.timestamp() > issued_at)
    }
}

/// Input data for creating a user. `password` is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Profile fields an administrator or the user themselves may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.photo.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(changed: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Laura Wilson".into(),
            email: "laura@example.io".into(),
            photo: None,
            role: Role::User,
            password: "$2b$12$hash".into(),
            password_changed_at: changed,
            password_reset_token: Some("abc".into()),
            password_reset_expires: None,
            active: true,
            created_at: Utc::now(),
            revision: 0,
        }
    }

    #[test]
    fn test_changed_password_after() {
        let now = Utc::now();
        let u = user(Some(now));

        assert!(u.changed_password_after((now - Duration::seconds(10)).timestamp()));
        assert!(!u.changed_password_after((now + Duration::seconds(10)).timestamp()));
        assert!(!user(None).changed_password_after(0));
    }

    #[test]
    fn test_sensitive_fields_not_serialized() {
        let value = serde_json::to_value(user(None)).unwrap();

        assert!(value.get("password").is_none());
        assert!(value.get("passwordResetToken").is_none());
        assert!(value.get("active").is_none());
        assert_eq!(value["role"], "user");
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("lead-guide".parse::<Role>().unwrap(), Role::LeadGuide);
        assert_eq!(serde_json::to_value(Role::LeadGuide).unwrap(), "lead-guide");
        assert!("owner".parse::<Role>().is_err());
    }
}

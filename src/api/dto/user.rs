//! DTOs for authentication and user endpoints.

use serde::Deserialize;
use serde_json::{Value, json};
use validator::{Validate, ValidationError};

use crate::application::services::Signup;
use crate::domain::entities::{Role, UserPatch};
use crate::error::AppError;

fn passwords_match(password: &Option<String>, confirm: &Option<String>) -> Result<(), ValidationError> {
    match (password, confirm) {
        (Some(p), Some(c)) if p != c => Err(ValidationError::new("password_confirm")
            .with_message("Passwords are not the same!".into())),
        _ => Ok(()),
    }
}

/// Request body for `POST /api/v1/users/signup`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_signup_confirm"))]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        required(message = "Please tell us your name!"),
        length(min = 1, message = "Please tell us your name!")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        required(message = "Please provide your email"),
        email(message = "Please provide a valid email")
    )]
    pub email: Option<String>,

    pub photo: Option<String>,

    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "Password must have at least 8 characters")
    )]
    pub password: Option<String>,

    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

fn validate_signup_confirm(req: &SignupRequest) -> Result<(), ValidationError> {
    passwords_match(&req.password, &req.password_confirm)
}

impl SignupRequest {
    /// Validates the body. Any `role` sent by the client is ignored.
    pub fn into_signup(self) -> Result<Signup, AppError> {
        self.validate()?;
        Ok(Signup {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            photo: self.photo,
            password: self.password.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when either field is missing.
    pub fn credentials(self) -> Result<(String, String), AppError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(AppError::bad_request(
                "Please provide email and password!",
                json!({}),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for `PATCH /api/v1/users/resetPassword/{token}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_reset_confirm"))]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "Password must have at least 8 characters")
    )]
    pub password: Option<String>,

    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

fn validate_reset_confirm(req: &ResetPasswordRequest) -> Result<(), ValidationError> {
    passwords_match(&req.password, &req.password_confirm)
}

impl ResetPasswordRequest {
    /// Returns the new password once both fields agree.
    pub fn into_password(self) -> Result<String, AppError> {
        self.validate()?;
        Ok(self.password.unwrap_or_default())
    }
}

/// Request body for `PATCH /api/v1/users/updateMyPassword`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_confirm"))]
pub struct UpdatePasswordRequest {
    #[validate(required(message = "Please provide your current password"))]
    pub password_current: Option<String>,

    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "Password must have at least 8 characters")
    )]
    pub password: Option<String>,

    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

fn validate_update_confirm(req: &UpdatePasswordRequest) -> Result<(), ValidationError> {
    passwords_match(&req.password, &req.password_confirm)
}

impl UpdatePasswordRequest {
    /// Returns `(current, new)`.
    pub fn into_passwords(self) -> Result<(String, String), AppError> {
        self.validate()?;
        Ok((
            self.password_current.unwrap_or_default(),
            self.password.unwrap_or_default(),
        ))
    }
}

/// Request body for `PATCH /api/v1/users/updateMe`.
///
/// Only `name`, `email` and `photo` are applied; everything else except the
/// password fields is ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    pub photo: Option<String>,

    pub password: Option<Value>,

    pub password_confirm: Option<Value>,
}

impl UpdateMeRequest {
    /// # Errors
    ///
    /// Rejects bodies carrying password fields before any other check.
    pub fn into_patch(self) -> Result<UserPatch, AppError> {
        if self.password.is_some() || self.password_confirm.is_some() {
            return Err(AppError::bad_request(
                "This route is not for password updates. Please use /updateMyPassword.",
                json!({}),
            ));
        }
        self.validate()?;

        Ok(UserPatch {
            name: self.name,
            email: self.email,
            photo: self.photo,
            role: None,
        })
    }
}

/// Request body for `PATCH /api/v1/users/{id}` (administrators).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    pub photo: Option<String>,

    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_patch(self) -> Result<UserPatch, AppError> {
        self.validate()?;
        let role = self
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?;

        Ok(UserPatch {
            name: self.name,
            email: self.email,
            photo: self.photo,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(body: Value) -> Result<Signup, AppError> {
        serde_json::from_value::<SignupRequest>(body)
            .unwrap()
            .into_signup()
    }

    #[test]
    fn test_signup_ignores_role() {
        let signup = signup(json!({
            "name": "Jonas Schmedtmann",
            "email": "jonas@example.io",
            "password": "pass1234",
            "passwordConfirm": "pass1234",
            "role": "admin"
        }))
        .unwrap();
        assert_eq!(signup.email, "jonas@example.io");
        assert_eq!(signup.password, "pass1234");
    }

    #[test]
    fn test_signup_password_mismatch() {
        let err = signup(json!({
            "name": "Jonas Schmedtmann",
            "email": "jonas@example.io",
            "password": "pass1234",
            "passwordConfirm": "pass4321"
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input data. Passwords are not the same!");
    }

    #[test]
    fn test_signup_invalid_email_and_short_password() {
        let err = signup(json!({
            "name": "Jonas Schmedtmann",
            "email": "not-an-email",
            "password": "short",
            "passwordConfirm": "short"
        }))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Please provide a valid email"));
        assert!(message.contains("Password must have at least 8 characters"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let req: LoginRequest = serde_json::from_value(json!({ "email": "a@b.io" })).unwrap();
        let err = req.credentials().unwrap_err();
        assert_eq!(err.to_string(), "Please provide email and password!");
    }

    #[test]
    fn test_update_me_rejects_passwords() {
        let req: UpdateMeRequest =
            serde_json::from_value(json!({ "name": "New Name", "password": "pass1234" })).unwrap();
        let err = req.into_patch().unwrap_err();
        assert_eq!(
            err.to_string(),
            "This route is not for password updates. Please use /updateMyPassword."
        );
    }

    #[test]
    fn test_update_me_drops_role() {
        let req: UpdateMeRequest =
            serde_json::from_value(json!({ "name": "New Name", "role": "admin" })).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.name.as_deref(), Some("New Name"));
        assert_eq!(patch.role, None);
    }

    #[test]
    fn test_update_user_parses_role() {
        let req: UpdateUserRequest =
            serde_json::from_value(json!({ "role": "lead-guide" })).unwrap();
        assert_eq!(req.into_patch().unwrap().role, Some(Role::LeadGuide));

        let req: UpdateUserRequest = serde_json::from_value(json!({ "role": "boss" })).unwrap();
        assert!(req.into_patch().is_err());
    }
}

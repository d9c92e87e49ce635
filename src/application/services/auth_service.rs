//! Sign-up, login, session verification and password management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{NewUser, Role, User};
use crate::domain::mailer::{Email, Mailer};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::jwt::JwtManager;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::reset_token;

/// Lifetime of a password reset token.
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Validated sign-up data.
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub password: String,
}

/// Service for account authentication.
///
/// Passwords are stored as bcrypt hashes; sessions are HS256 tokens whose
/// subject is the user id. Reset tokens are random, delivered through the
/// [`Mailer`] and stored only as SHA-256 digests.
pub struct AuthService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtManager,
    mailer: Arc<dyn Mailer>,
    public_url: String,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(
        repository: Arc<R>,
        jwt: JwtManager,
        mailer: Arc<dyn Mailer>,
        public_url: String,
    ) -> Self {
        Self {
            repository,
            jwt,
            mailer,
            public_url,
        }
    }

    fn session(&self, user: User) -> Result<Session, AppError> {
        let token = self.jwt.issue(user.id)?;
        Ok(Session { user, token })
    }

    /// Creates an account with role `user` and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the email is already registered.
    pub async fn signup(&self, signup: Signup) -> Result<Session, AppError> {
        let password = hash_password(&signup.password).await?;
        let user = self
            .repository
            .insert(NewUser {
                name: signup.name,
                email: signup.email,
                photo: signup.photo,
                role: Role::User,
                password,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        self.session(user)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown email or wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let incorrect = || AppError::unauthorized("Incorrect email or password", json!({}));

        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(incorrect)?;

        if !verify_password(password, &user.password).await? {
            return Err(incorrect());
        }

        self.session(user)
    }

    /// Resolves a session token to the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is invalid or expired,
    /// the user no longer exists, or the password changed after the token was
    /// issued.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.jwt.verify(token)?;

        let user = self
            .repository
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "The user belonging to this token does no longer exist.",
                    json!({}),
                )
            })?;

        if user.changed_password_after(claims.iat) {
            return Err(AppError::unauthorized(
                "User recently changed password! Please log in again.",
                json!({}),
            ));
        }

        Ok(user)
    }

    /// Issues a reset token and mails the reset link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown email and
    /// [`AppError::Server`] when the mail cannot be delivered; in that case the
    /// stored token is cleared again.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                AppError::not_found("There is no user with that email address.", json!({}))
            })?;

        let token = reset_token::generate();
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.repository
            .set_reset_token(user.id, Some((reset_token::hash(&token), expires)))
            .await?;

        let reset_url = format!("{}/api/v1/users/resetPassword/{token}", self.public_url);
        let email = Email {
            to: user.email.clone(),
            subject: format!("Your password reset token (valid for {RESET_TOKEN_TTL_MINUTES} min)"),
            text: format!(
                "Forgot your password? Submit a PATCH request with your new password and passwordConfirm to: {reset_url}.\nIf you didn't forget your password, please ignore this email!"
            ),
        };

        if let Err(e) = self.mailer.send(email).await {
            tracing::error!(user_id = %user.id, error = %e, "failed to send password reset email");
            self.repository.set_reset_token(user.id, None).await?;
            return Err(AppError::server(
                "There was an error sending the email. Try again later!",
                json!({}),
            ));
        }

        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the token is unknown or expired.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<Session, AppError> {
        let user = self
            .repository
            .find_by_reset_token(&reset_token::hash(token))
            .await?
            .ok_or_else(|| AppError::bad_request("Token is invalid or has expired", json!({})))?;

        let user = self.change_password(user.id, password).await?;
        self.session(user)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `current` does not match.
    pub async fn update_password(
        &self,
        user_id: Uuid,
        current: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let user = self.repository.find_by_id(user_id).await?.ok_or_else(|| {
            AppError::unauthorized(
                "The user belonging to this token does no longer exist.",
                json!({}),
            )
        })?;

        if !verify_password(current, &user.password).await? {
            return Err(AppError::unauthorized(
                "Your current password is wrong.",
                json!({}),
            ));
        }

        let user = self.change_password(user.id, password).await?;
        self.session(user)
    }

    /// Tokens are issued with second precision, so the change is recorded one
    /// second in the past to keep the token issued right after it valid.
    async fn change_password(&self, user_id: Uuid, password: &str) -> Result<User, AppError> {
        let hash = hash_password(password).await?;
        let changed_at = Utc::now() - Duration::seconds(1);
        self.repository.set_password(user_id, &hash, changed_at).await
    }
}

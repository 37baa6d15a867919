//! Signup, login, refresh, logout and token verification.
//!
//! Session lifecycle per user: signup or login moves an anonymous caller to
//! authenticated and stores the new refresh token as the user's only valid one.
//! Refresh rotates the pair and overwrites that stored token, so a refresh
//! token can be exchanged at most once. Logout clears it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::AuthenticatedUser;
use crate::db::{Database, User};
use crate::jwt::{JwtConfig, JwtError};
use crate::password::{PasswordError, hash_password, verify_password};
use crate::wire::TokenPair;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to sign token: {0}")]
    Signing(JwtError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Password task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: Arc<JwtConfig>,
    bcrypt_cost: u32,
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, bcrypt_cost: u32) -> Self {
        Self {
            db,
            jwt,
            bcrypt_cost,
        }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Register a new user, then log them in.
    pub async fn signup(&self, email: &str, password: &str) -> Result<TokenPair, AuthServiceError> {
        let email = normalize_email(email);

        if !self.db.users().is_email_available(&email).await? {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_owned = password.to_string();
        let cost = self.bcrypt_cost;
        let hash =
            tokio::task::spawn_blocking(move || hash_password(&password_owned, cost)).await??;

        let user_id = match self.db.users().create(&email, &hash).await {
            Ok(id) => id,
            // Lost a race with a concurrent signup for the same email
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AuthServiceError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };
        info!(user_id, "User signed up");

        self.login(&email, password).await
    }

    /// Check credentials and start a new session, replacing any previous refresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthServiceError> {
        let email = normalize_email(email);

        let Some(user) = self.db.users().get_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(AuthServiceError::InvalidCredentials);
        };

        let password_owned = password.to_string();
        let hash = user.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password_owned, &hash)).await??;

        if !matches {
            debug!(user_id = user.id, "Login with wrong password");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let pair = self.start_session(&user).await?;
        info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Exchange the user's current refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthServiceError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| {
                debug!(error = %e, "Rejected refresh token");
                AuthServiceError::InvalidToken
            })?;

        let user_id = claims.user_id().ok_or(AuthServiceError::InvalidToken)?;
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::InvalidToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            warn!(user_id, "Refresh token is not the user's current token");
            return Err(AuthServiceError::InvalidToken);
        }

        let pair = self.start_session(&user).await?;
        debug!(user_id, "Rotated token pair");
        Ok(pair)
    }

    /// Forget the user's refresh token. Safe to call repeatedly.
    pub async fn logout(&self, user_id: i64) -> Result<(), AuthServiceError> {
        self.db.users().clear_refresh_token(user_id).await?;
        info!(user_id, "User logged out");
        Ok(())
    }

    /// Resolve an access token to its user.
    pub async fn verify(&self, access_token: &str) -> Result<AuthenticatedUser, AuthServiceError> {
        let claims = self
            .jwt
            .validate_access_token(access_token)
            .map_err(|_| AuthServiceError::InvalidToken)?;

        let user_id = claims.user_id().ok_or(AuthServiceError::InvalidToken)?;
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            claims,
        })
    }

    async fn start_session(&self, user: &User) -> Result<TokenPair, AuthServiceError> {
        let pair = self
            .jwt
            .issue_pair(user.id, &user.email)
            .map_err(AuthServiceError::Signing)?;

        self.db
            .users()
            .set_refresh_token(user.id, &pair.refresh.token, pair.refresh.expires_at)
            .await?;

        Ok(TokenPair {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
        })
    }
}

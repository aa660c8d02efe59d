// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account API operations that make up the session lifecycle.
//!
//! Handles:
//! - Login (authenticate, then fetch and cache the profile)
//! - Registration and password management
//! - Session checks against the server
//! - Logout

use crate::error::AuthError;
use crate::http::{endpoints, ApiClient};
use crate::models::auth::{PasswordChange, PasswordResetFinish};
use crate::models::{AuthResponse, Credentials, RegisterRequest, UserProfile};
use crate::store::SessionStore;
use crate::token::AuthToken;
use crate::validation::{validate_email, validate_password, ValidationError};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: AuthToken,
    pub token_type: Option<String>,
    pub user: UserProfile,
}

/// Session lifecycle operations over the account API.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    store: SessionStore,
}

impl AuthService {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // ─── Login / Logout ──────────────────────────────────────────────────────

    /// Log in and persist the session.
    ///
    /// Authenticating and fetching the profile are two requests. The token
    /// must be stored before the profile fetch (the bearer interceptor reads
    /// it from the store), so any failure after that point clears the whole
    /// session, including a profile left over from an earlier login.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AuthError> {
        validate_email(&credentials.identifier)?;
        validate_password(&credentials.secret)?;

        let response: AuthResponse = self
            .api
            .post_json(endpoints::AUTHENTICATE, &credentials.to_request())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Authentication failed"))?;

        let token = AuthToken::new(response.id_token);
        if token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "authenticate response carried no id_token".to_string(),
            ));
        }

        self.store.save_token(&token).await?;

        let user = match self.fetch_and_cache_profile().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch after login failed, clearing session");
                if let Err(clear_err) = self.store.clear().await {
                    tracing::error!(error = %clear_err, "Failed to roll back partial login");
                }
                return Err(e);
            }
        };

        tracing::info!(login = %user.login_id, "Logged in");
        Ok(LoginOutcome {
            token,
            token_type: response.token_type,
            user,
        })
    }

    async fn fetch_and_cache_profile(&self) -> Result<UserProfile, AuthError> {
        let user = self.current_user().await?;
        self.store.save_profile(&user).await?;
        Ok(user)
    }

    /// Remove the stored token and profile.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    // ─── Account ─────────────────────────────────────────────────────────────

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, AuthError> {
        if request.login.trim().is_empty() {
            return Err(ValidationError::MissingField("login").into());
        }
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user: UserProfile = self.api.post_json(endpoints::REGISTER, request).await?;
        tracing::info!(login = %user.login_id, "Account registered");
        Ok(user)
    }

    /// Fetch the account record for the stored token. Not cached.
    pub async fn current_user(&self) -> Result<UserProfile, AuthError> {
        self.api.get_json(endpoints::ACCOUNT).await
    }

    /// Fetch the account record and replace the cached copy.
    pub async fn refresh_user(&self) -> Result<UserProfile, AuthError> {
        self.fetch_and_cache_profile().await
    }

    /// True only when a token is stored and the server accepts it.
    pub async fn is_authenticated(&self) -> bool {
        self.check_session().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Session check failed");
            false
        })
    }

    /// Ask the server about the stored token.
    ///
    /// `Ok(false)` means there is no token or the server rejected it. Any
    /// other failure (outage, timeout) is returned so a live session is not
    /// mistaken for a dead one.
    pub async fn check_session(&self) -> Result<bool, AuthError> {
        if self.store.token().await.is_none() {
            return Ok(false);
        }

        match self.api.get(endpoints::AUTHENTICATE).await {
            Ok(()) => Ok(true),
            Err(AuthError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Cached profile, if any.
    pub async fn stored_user(&self) -> Option<UserProfile> {
        self.store.profile().await
    }

    /// Stored token, if any.
    pub async fn token(&self) -> Option<AuthToken> {
        self.store.token().await
    }

    // ─── Passwords ───────────────────────────────────────────────────────────

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        if self.store.token().await.is_none() {
            return Err(AuthError::Unauthorized);
        }

        self.api
            .post(
                endpoints::CHANGE_PASSWORD,
                &PasswordChange {
                    current_password,
                    new_password,
                },
            )
            .await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Ask the server to email a reset key. The body is the bare address.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        validate_email(email)?;
        self.api.post_raw(endpoints::RESET_PASSWORD_INIT, email).await?;
        tracing::info!("Password reset requested");
        Ok(())
    }

    pub async fn finish_password_reset(&self, key: &str, new_password: &str) -> Result<(), AuthError> {
        if key.trim().is_empty() {
            return Err(ValidationError::MissingField("reset key").into());
        }
        validate_password(new_password)?;

        self.api
            .post(
                endpoints::RESET_PASSWORD_FINISH,
                &PasswordResetFinish { key, new_password },
            )
            .await?;
        tracing::info!("Password reset completed");
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the session lifecycle with user-facing messages.

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Error returned by every auth and session operation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Secure storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Account API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("{0} already in progress")]
    Busy(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub const MSG_INVALID_CREDENTIALS: &'static str =
        "Invalid email or password. Please try again.";
    pub const MSG_BAD_REQUEST: &'static str = "Please check your email and password format.";
    pub const MSG_NETWORK: &'static str = "Network error. Please check your internet connection.";
    pub const MSG_GENERIC: &'static str = "Login failed. Please try again later.";

    /// True for a 401 from the server (bad credentials or an expired session).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized)
    }

    pub const MSG_SIGN_IN_AGAIN: &'static str = "Your session has ended. Please sign in again.";
    pub const MSG_REQUEST_FAILED: &'static str = "Something went wrong. Please try again later.";

    /// Message for account screens other than sign-in.
    pub fn account_message(&self) -> String {
        match self {
            AuthError::Validation(err) => err.to_string(),
            AuthError::Unauthorized => Self::MSG_SIGN_IN_AGAIN.to_string(),
            AuthError::Network(_) => Self::MSG_NETWORK.to_string(),
            AuthError::Busy(_) => self.to_string(),
            _ => Self::MSG_REQUEST_FAILED.to_string(),
        }
    }

    /// Message suitable for showing on the sign-in screens.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(err) => err.to_string(),
            AuthError::Unauthorized => Self::MSG_INVALID_CREDENTIALS.to_string(),
            AuthError::BadRequest(_) => Self::MSG_BAD_REQUEST.to_string(),
            AuthError::Network(_) => Self::MSG_NETWORK.to_string(),
            _ => Self::MSG_GENERIC.to_string(),
        }
    }
}

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

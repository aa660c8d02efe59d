// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secure token store.
//!
//! Two logical entries live here: the bearer token and the cached user
//! profile. [`SecureStore`] is the raw key-value contract; [`SessionStore`]
//! keeps the two entries paired.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::UserProfile;
use crate::token::AuthToken;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// The two entries the session lifecycle persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Token,
    Profile,
}

impl StoreKey {
    pub const ALL: [StoreKey; 2] = [StoreKey::Token, StoreKey::Profile];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Token => "authToken",
            StoreKey::Profile => "userData",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("secure store unavailable: {0}")]
    Unavailable(String),

    #[error("secure store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secure store entry {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("secure store encryption error")]
    Crypto,
}

/// Durable, confidential key-value storage.
///
/// Each `set`/`delete` must be atomic for its key.
#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, key: StoreKey) -> Result<(), StoreError>;
}

/// A token and profile that were found together in the store.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub token: AuthToken,
    pub user: UserProfile,
}

/// Typed view over a [`SecureStore`] that reads and writes the token and
/// profile as a pair.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn SecureStore>,
}

impl SessionStore {
    pub fn new(inner: Arc<dyn SecureStore>) -> Self {
        Self { inner }
    }

    /// Current token. A read failure is logged and treated as "no token".
    pub async fn token(&self) -> Option<AuthToken> {
        match self.try_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Token read failed, treating as signed out");
                None
            }
        }
    }

    /// Current token, surfacing storage errors.
    pub async fn try_token(&self) -> Result<Option<AuthToken>, StoreError> {
        Ok(self
            .inner
            .get(StoreKey::Token)
            .await?
            .map(AuthToken::new)
            .filter(|t| !t.is_empty()))
    }

    /// Cached profile. Read and parse failures are logged and yield `None`.
    pub async fn profile(&self) -> Option<UserProfile> {
        let raw = match self.inner.get(StoreKey::Profile).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Profile read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Cached profile is not valid JSON, ignoring");
                None
            }
        }
    }

    /// Both halves of a session, only when both are present.
    pub async fn load(&self) -> Option<StoredSession> {
        let token = self.token().await?;
        let user = self.profile().await?;
        Some(StoredSession { token, user })
    }

    pub async fn save_token(&self, token: &AuthToken) -> Result<(), StoreError> {
        self.inner.set(StoreKey::Token, token.as_str()).await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile).map_err(|e| StoreError::Corrupt {
            key: StoreKey::Profile.to_string(),
            reason: e.to_string(),
        })?;
        self.inner.set(StoreKey::Profile, &json).await
    }

    /// Write token then profile. If the profile write fails both entries
    /// are deleted so the store never holds half a session.
    pub async fn save(&self, token: &AuthToken, profile: &UserProfile) -> Result<(), StoreError> {
        self.save_token(token).await?;

        if let Err(e) = self.save_profile(profile).await {
            if let Err(clear_err) = self.clear().await {
                tracing::error!(error = %clear_err, "Failed to roll back stored token");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Delete both entries. Both deletes are attempted; the first failure
    /// is returned.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for key in StoreKey::ALL {
            if let Err(e) = self.inner.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete store entry");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Presence of each half, for invariant checks and repair.
    pub async fn presence(&self) -> (bool, bool) {
        let token = self.token().await.is_some();
        let profile = matches!(self.inner.get(StoreKey::Profile).await, Ok(Some(_)));
        (token, profile)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token handling.
//!
//! The token is opaque to the client. When it happens to be a JWT we peek
//! at its `exp` claim so a session that is already dead can be dropped at
//! startup without a network round trip. Signatures are never checked here;
//! the server stays the only authority.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;

/// Opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

/// Registered claims we look at. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Expiry of a JWT token, or `None` for opaque tokens.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<ExpiryClaims>(&self.0, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
        DateTime::from_timestamp(data.claims.exp?, 0)
    }

    /// True only for a JWT whose `exp` is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([redacted])")
    }
}

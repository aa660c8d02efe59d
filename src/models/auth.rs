// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and response bodies for the authenticate and password endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials typed into the login form. Never persisted.
#[derive(Clone)]
pub struct Credentials {
    /// Email address used as the username
    pub identifier: String,
    pub secret: String,
    /// Ask the server for a long-lived token ("remember me")
    pub persist: bool,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            persist: true,
        }
    }

    pub fn remember(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub(crate) fn to_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            username: &self.identifier,
            password: &self.secret,
            remember_me: self.persist,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[redacted]")
            .field("persist", &self.persist)
            .finish()
    }
}

/// Body of `POST /api/authenticate`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

/// Response of `POST /api/authenticate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub id_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordResetFinish<'a> {
    pub key: &'a str,
    pub new_password: &'a str,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account models for the Zenark account API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User profile as returned by `GET /api/account`.
///
/// Cached next to the session token. The server record is authoritative;
/// this copy is refreshed on login and on explicit re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account login
    #[serde(rename = "login")]
    pub login_id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub activated: bool,
    /// Granted authorities, e.g. `ROLE_USER`
    #[serde(rename = "authorities", default)]
    pub roles: BTreeSet<String>,
    /// Language key
    #[serde(rename = "langKey", default)]
    pub locale: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.login_id.clone()
        } else {
            name.to_string()
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local
//! development.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default account API host.
pub const DEFAULT_API_BASE_URL: &str = "http://13.204.79.120/zenark/api/v2";

/// Default transport timeout for account API calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the account API (no trailing slash needed)
    pub api_base_url: String,
    /// Directory holding the encrypted session store
    pub store_dir: PathBuf,
    /// AES-256 key for the session store; when absent a key file next to
    /// the store is used
    pub store_key: Option<Vec<u8>>,
    /// Hard timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("store_dir", &self.store_dir)
            .field("store_key", &self.store_key.as_ref().map(|_| "[redacted]"))
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Config {
    /// Config for tests: points at `api_base_url` and a throwaway store dir.
    pub fn test_default(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            store_dir: env::temp_dir().join("zenark-client-test"),
            store_key: Some(vec![0x42; 32]),
            http_timeout: Duration::from_secs(5),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("ZENARK_API_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "ZENARK_API_URL",
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let store_dir = match env::var("ZENARK_STORE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_store_dir()?,
        };

        let store_key = match env::var("ZENARK_STORE_KEY") {
            Ok(encoded) => Some(decode_store_key(&encoded)?),
            Err(_) => None,
        };

        let http_timeout = match env::var("ZENARK_HTTP_TIMEOUT_SECS") {
            Ok(secs) => {
                let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "ZENARK_HTTP_TIMEOUT_SECS",
                    reason: format!("not a number of seconds: {}", secs),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            store_dir,
            store_key,
            http_timeout,
        })
    }
}

fn default_store_dir() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("com", "Zenark", "zenark")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::Missing("ZENARK_STORE_DIR"))
}

fn decode_store_key(encoded: &str) -> Result<Vec<u8>, ConfigError> {
    let key = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::Invalid {
            var: "ZENARK_STORE_KEY",
            reason: e.to_string(),
        })?;

    if key.len() != crate::store::file::KEY_LEN {
        return Err(ConfigError::Invalid {
            var: "ZENARK_STORE_KEY",
            reason: format!("expected 32 bytes, got {}", key.len()),
        });
    }
    Ok(key)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zenark client: authentication session lifecycle.
//!
//! This crate provides login, secure token storage, token-bearing requests
//! and server-signalled invalidation for the Zenark mental-wellness app.
//! Screens sit on top of [`session::SessionContext`].

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
pub mod token;
pub mod validation;

use config::Config;
use error::AuthError;
use http::ApiClient;
use services::AuthService;
use session::SessionContext;
use std::sync::Arc;
use store::{FileStore, SecureStore, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionContext>,
}

impl AppState {
    /// Wire the client together over an arbitrary secure store.
    pub fn new(config: Config, store: Arc<dyn SecureStore>) -> Result<Self, AuthError> {
        let store = SessionStore::new(store);
        let api = ApiClient::new(&config, store.clone())?;
        let auth = AuthService::new(api, store);

        Ok(Self {
            config,
            session: Arc::new(SessionContext::new(auth)),
        })
    }

    /// Open the encrypted on-disk store named by `config` and wire the client.
    pub async fn open(config: Config) -> Result<Self, AuthError> {
        let store =
            FileStore::open_with_key_file(&config.store_dir, config.store_key.as_deref()).await?;
        tracing::debug!(path = %store.path().display(), "Opened secure store");
        Self::new(config, Arc::new(store))
    }

    pub fn auth(&self) -> &AuthService {
        self.session.auth()
    }
}

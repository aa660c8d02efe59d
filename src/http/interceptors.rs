// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request/response interceptors.
//!
//! Every request sent through [`super::ApiClient`] runs `on_request` on each
//! interceptor in order before it is sent, and `on_response` on each
//! interceptor in order before the caller sees the result.

use crate::store::SessionStore;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use tokio::sync::broadcast;

/// Session lifecycle events published by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the stored token (HTTP 401) and the stored
    /// session has been cleared.
    Invalidated,
}

/// Hook around every request.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    async fn on_response(&self, _status: StatusCode) {}
}

/// Attaches `Authorization: Bearer <token>` when a token is stored.
pub struct BearerAuth {
    store: SessionStore,
}

impl BearerAuth {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Interceptor for BearerAuth {
    async fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.token().await {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }
}

/// Clears the stored session on HTTP 401 and announces it.
pub struct InvalidateOnUnauthorized {
    store: SessionStore,
    events: broadcast::Sender<SessionEvent>,
}

impl InvalidateOnUnauthorized {
    pub fn new(store: SessionStore, events: broadcast::Sender<SessionEvent>) -> Self {
        Self { store, events }
    }
}

#[async_trait]
impl Interceptor for InvalidateOnUnauthorized {
    async fn on_response(&self, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }

        tracing::info!("Server rejected session (401), clearing stored credentials");
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "Failed to clear session after 401");
        }

        // No subscribers is fine; nobody is tracking session state yet.
        let _ = self.events.send(SessionEvent::Invalidated);
    }
}

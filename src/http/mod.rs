// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the Zenark account API.
//!
//! Handles:
//! - Bearer token injection from the secure store
//! - Session invalidation on 401
//! - Mapping HTTP status codes onto [`AuthError`]

pub mod interceptors;

pub use interceptors::{BearerAuth, Interceptor, InvalidateOnUnauthorized, SessionEvent};

use crate::config::Config;
use crate::error::AuthError;
use crate::store::SessionStore;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Account API endpoint paths, relative to the configured base URL.
pub mod endpoints {
    pub const AUTHENTICATE: &str = "/api/authenticate";
    pub const REGISTER: &str = "/api/register";
    pub const ACCOUNT: &str = "/api/account";
    pub const CHANGE_PASSWORD: &str = "/api/account/change-password";
    pub const RESET_PASSWORD_INIT: &str = "/api/account/reset-password/init";
    pub const RESET_PASSWORD_FINISH: &str = "/api/account/reset-password/finish";
}

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Account API client with an ordered interceptor chain.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client with the standard interceptors: bearer token
    /// injection and invalidation on 401.
    pub fn new(config: &Config, store: SessionStore) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let client = Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            interceptors: Vec::new(),
            events: events.clone(),
        };

        Ok(client
            .with_interceptor(Arc::new(BearerAuth::new(store.clone())))
            .with_interceptor(Arc::new(InvalidateOnUnauthorized::new(store, events))))
    }

    /// Append an interceptor to the end of the chain.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Subscribe to session events (e.g. server-side invalidation).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with a JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let response = self.send(self.http.request(Method::GET, self.url(path))).await?;
        parse_json(response).await
    }

    /// GET where only the status matters.
    pub async fn get(&self, path: &str) -> Result<(), AuthError> {
        self.send(self.http.request(Method::GET, self.url(path)))
            .await
            .map(|_| ())
    }

    /// POST a JSON body and parse a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let request = self.http.request(Method::POST, self.url(path)).json(body);
        let response = self.send(request).await?;
        parse_json(response).await
    }

    /// POST a JSON body, ignoring the response body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), AuthError> {
        let request = self.http.request(Method::POST, self.url(path)).json(body);
        self.send(request).await.map(|_| ())
    }

    /// POST a raw string body (sent as-is, JSON content type).
    pub async fn post_raw(&self, path: &str, body: &str) -> Result<(), AuthError> {
        let request = self
            .http
            .request(Method::POST, self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(request).await.map(|_| ())
    }

    /// Run the interceptor chain around a request and map failures.
    async fn send(&self, mut request: RequestBuilder) -> Result<reqwest::Response, AuthError> {
        for interceptor in &self.interceptors {
            request = interceptor.on_request(request).await;
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Account API request failed");
            AuthError::Network(e.to_string())
        })?;

        let status = response.status();
        for interceptor in &self.interceptors {
            interceptor.on_response(status).await;
        }

        check_response(response).await
    }
}

/// Check response status and return an error if not successful.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), path = %url, "Account API returned error");

    Err(match status {
        StatusCode::UNAUTHORIZED => AuthError::Unauthorized,
        StatusCode::BAD_REQUEST => AuthError::BadRequest(body),
        _ => AuthError::Api {
            status: status.as_u16(),
            body,
        },
    })
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
    response
        .json()
        .await
        .map_err(|e| AuthError::InvalidResponse(format!("JSON parse error: {}", e)))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zenark_client::config::Config;
use zenark_client::store::{MemoryStore, SecureStore, StoreError, StoreKey};
use zenark_client::AppState;

#[allow(dead_code)]
pub const EMAIL: &str = "user@example.com";
#[allow(dead_code)]
pub const PASSWORD: &str = "Abcdef1!";
#[allow(dead_code)]
pub const TOKEN: &str = "abc123";

/// Account record the mock server hands out.
#[allow(dead_code)]
pub fn profile_json() -> serde_json::Value {
    serde_json::json!({
        "login": "user",
        "firstName": "A",
        "lastName": "B",
        "email": EMAIL,
        "activated": true,
        "langKey": "en",
        "authorities": ["ROLE_USER"],
        "imageUrl": null,
    })
}

/// Mount `POST /api/authenticate` returning `token`.
#[allow(dead_code)]
pub async fn mount_authenticate(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_token": token,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

/// Mount `GET /api/account` for requests bearing `token`.
#[allow(dead_code)]
pub async fn mount_account(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .mount(server)
        .await;
}

/// Mount a complete happy-path login.
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer) {
    mount_authenticate(server, TOKEN).await;
    mount_account(server, TOKEN).await;
}

/// App state over an in-memory store, talking to `server`.
#[allow(dead_code)]
pub fn memory_app(server: &MockServer) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = AppState::new(Config::test_default(&server.uri()), store.clone())
        .expect("Failed to build app state");
    (app, store)
}

/// App state over an arbitrary store.
#[allow(dead_code)]
pub fn app_with_store(server: &MockServer, store: Arc<dyn SecureStore>) -> AppState {
    AppState::new(Config::test_default(&server.uri()), store).expect("Failed to build app state")
}

/// Seed a complete stored session.
#[allow(dead_code)]
pub async fn seed_session(store: &dyn SecureStore, token: &str) {
    store.set(StoreKey::Token, token).await.unwrap();
    store
        .set(StoreKey::Profile, &profile_json().to_string())
        .await
        .unwrap();
}

/// Presence of (token, profile) in the raw store.
#[allow(dead_code)]
pub async fn presence(store: &dyn SecureStore) -> (bool, bool) {
    (
        store.get(StoreKey::Token).await.unwrap().is_some(),
        store.get(StoreKey::Profile).await.unwrap().is_some(),
    )
}

/// Number of requests the mock server has seen.
#[allow(dead_code)]
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

/// Memory store whose operations can be switched to fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_token_writes: AtomicBool,
    pub fail_profile_writes: AtomicBool,
    pub fail_deletes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("keystore locked".to_string())
}

#[async_trait]
impl SecureStore for FlakyStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        let fail = match key {
            StoreKey::Token => &self.fail_token_writes,
            StoreKey::Profile => &self.fail_profile_writes,
        };
        if fail.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: StoreKey) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete(key).await
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login flow against a mock account API.

use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zenark_client::config::Config;
use zenark_client::error::AuthError;
use zenark_client::models::Credentials;
use zenark_client::store::{MemoryStore, SecureStore, StoreKey};
use zenark_client::validation::ValidationError;
use zenark_client::AppState;

mod common;
use common::{FlakyStore, EMAIL, PASSWORD, TOKEN};

#[tokio::test]
async fn test_login_stores_token_and_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .and(body_json(serde_json::json!({
            "username": EMAIL,
            "password": PASSWORD,
            "rememberMe": true,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id_token": TOKEN })),
        )
        .expect(1)
        .mount(&server)
        .await;
    common::mount_account(&server, TOKEN).await;

    let (app, store) = common::memory_app(&server);
    let outcome = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .expect("login should succeed");

    assert_eq!(outcome.token.as_str(), TOKEN);
    assert_eq!(outcome.token_type, None);
    assert_eq!(outcome.user.login_id, "user");
    assert_eq!(outcome.user.first_name, "A");

    assert_eq!(
        store.get(StoreKey::Token).await.unwrap().as_deref(),
        Some(TOKEN)
    );
    let stored = app.auth().stored_user().await.expect("profile cached");
    assert_eq!(stored, outcome.user);
    assert_eq!(app.auth().token().await.map(|t| t.into_inner()), Some(TOKEN.to_string()));
}

#[tokio::test]
async fn test_login_respects_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zenark/api/v2/api/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id_token": TOKEN })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zenark/api/v2/api/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::profile_json()))
        .mount(&server)
        .await;

    let config = Config::test_default(&format!("{}/zenark/api/v2/", server.uri()));
    let app = AppState::new(config, Arc::new(MemoryStore::new())).unwrap();

    app.auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .expect("login should succeed under a base path");
}

#[tokio::test]
async fn test_login_rejects_bad_input_without_network() {
    let server = MockServer::start().await;
    let (app, store) = common::memory_app(&server);

    let err = app
        .auth()
        .login(&Credentials::new("bad-email", "x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(ValidationError::InvalidEmail)
    ));

    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, "password"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(ValidationError::WeakPassword)
    ));

    assert_eq!(common::request_count(&server).await, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_rolls_back_token_when_profile_fetch_fails() {
    let server = MockServer::start().await;
    common::mount_authenticate(&server, TOKEN).await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (app, store) = common::memory_app(&server);
    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Api { status: 500, .. }));
    assert_eq!(common::presence(&*store).await, (false, false));
}

#[tokio::test]
async fn test_login_rolls_back_token_when_profile_write_fails() {
    let server = MockServer::start().await;
    common::mount_login(&server).await;

    let store = Arc::new(FlakyStore::new());
    FlakyStore::set_flag(&store.fail_profile_writes, true);
    let app = common::app_with_store(&server, store.clone());

    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert_eq!(common::presence(&store.inner).await, (false, false));
}

#[tokio::test]
async fn test_login_surfaces_token_write_failure() {
    let server = MockServer::start().await;
    common::mount_login(&server).await;

    let store = Arc::new(FlakyStore::new());
    FlakyStore::set_flag(&store.fail_token_writes, true);
    let app = common::app_with_store(&server, store.clone());

    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    // Never got as far as the profile fetch.
    assert_eq!(common::request_count(&server).await, 1);
    assert_eq!(common::presence(&store.inner).await, (false, false));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (app, store) = common::memory_app(&server);
    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), AuthError::MSG_INVALID_CREDENTIALS);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("malformed"))
        .mount(&server)
        .await;

    let (app, _store) = common::memory_app(&server);
    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    match err {
        AuthError::BadRequest(body) => assert_eq!(body, "malformed"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_network_failure() {
    // Grab a free port and close it again so connections are refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = Config::test_default(&format!("http://{}", addr));

    let store = Arc::new(MemoryStore::new());
    let app = AppState::new(config, store.clone()).unwrap();
    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(err.user_message(), AuthError::MSG_NETWORK);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_without_token_in_response() {
    let server = MockServer::start().await;
    common::mount_authenticate(&server, "").await;

    let (app, store) = common::memory_app(&server);
    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_replaces_previous_session() {
    let server = MockServer::start().await;
    common::mount_authenticate(&server, "second").await;
    common::mount_account(&server, "second").await;

    let (app, store) = common::memory_app(&server);
    common::seed_session(&*store, "first").await;

    app.auth()
        .login(&Credentials::new(EMAIL, PASSWORD).remember(false))
        .await
        .expect("login should succeed");

    assert_eq!(
        store.get(StoreKey::Token).await.unwrap().as_deref(),
        Some("second")
    );
}

#[tokio::test]
async fn test_failed_relogin_does_not_leave_stale_profile() {
    let server = MockServer::start().await;
    common::mount_authenticate(&server, "second").await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (app, store) = common::memory_app(&server);
    common::seed_session(&*store, "first").await;

    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Api { status: 500, .. }));
    assert_eq!(common::presence(&*store).await, (false, false));
}

#[tokio::test]
async fn test_relogin_profile_write_failure_clears_old_session() {
    let server = MockServer::start().await;
    common::mount_authenticate(&server, "second").await;
    common::mount_account(&server, "second").await;

    let store = Arc::new(FlakyStore::new());
    common::seed_session(&store.inner, "first").await;
    FlakyStore::set_flag(&store.fail_profile_writes, true);
    let app = common::app_with_store(&server, store.clone());

    let err = app
        .auth()
        .login(&Credentials::new(EMAIL, PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert_eq!(common::presence(&store.inner).await, (false, false));
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide session state.
//!
//! [`SessionContext`] is the single owner of [`SessionState`]. UI code reads
//! it through [`SessionContext::state`] or follows changes with
//! [`SessionContext::subscribe`]; only the context writes it.

use crate::error::AuthError;
use crate::http::SessionEvent;
use crate::models::{Credentials, UserProfile};
use crate::services::{AuthService, LoginOutcome};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Stored session not read yet.
    Restoring,
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// Last login failed; carries the user-facing message.
    Error(String),
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
}

/// What a protected screen should do for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Still restoring; show a loading indicator.
    Pending,
    RedirectToLogin,
    Granted,
}

impl SessionState {
    fn with_status(status: SessionStatus) -> Self {
        Self { status, user: None }
    }

    fn authenticated(user: UserProfile) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Restoring | SessionStatus::Authenticating
        )
    }

    pub fn route_access(&self) -> RouteAccess {
        match self.status {
            SessionStatus::Restoring => RouteAccess::Pending,
            SessionStatus::Authenticated => RouteAccess::Granted,
            _ => RouteAccess::RedirectToLogin,
        }
    }
}

/// Owner of the session state and entry point for session-mutating calls.
///
/// Login is single-flight: while a login or logout is running, another
/// login is rejected with [`AuthError::Busy`]. Logout waits its turn.
pub struct SessionContext {
    auth: AuthService,
    state: watch::Sender<SessionState>,
    mutation: Mutex<()>,
}

impl SessionContext {
    pub fn new(auth: AuthService) -> Self {
        let (state, _) = watch::channel(SessionState::with_status(SessionStatus::Restoring));
        Self {
            auth,
            state,
            mutation: Mutex::new(()),
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: SessionState) {
        tracing::debug!(status = ?next.status, "Session state changed");
        self.state.send_replace(next);
    }

    /// Rehydrate from the secure store.
    ///
    /// A half-present session (token without profile or the reverse) and a
    /// JWT that has already expired are both cleared.
    pub async fn restore(&self) -> SessionState {
        let _guard = self.mutation.lock().await;
        let store = self.auth.store();

        let next = match store.load().await {
            Some(session) if session.token.is_expired_at(Utc::now()) => {
                tracing::info!("Stored token has expired, discarding session");
                self.clear_quietly().await;
                SessionState::with_status(SessionStatus::Unauthenticated)
            }
            Some(session) => {
                tracing::info!(login = %session.user.login_id, "Session restored");
                SessionState::authenticated(session.user)
            }
            None => {
                if store.presence().await != (false, false) {
                    tracing::warn!("Found half a stored session, clearing it");
                    self.clear_quietly().await;
                }
                SessionState::with_status(SessionStatus::Unauthenticated)
            }
        };

        self.set_state(next.clone());
        next
    }

    async fn clear_quietly(&self) {
        if let Err(e) = self.auth.store().clear().await {
            tracing::warn!(error = %e, "Failed to clear stale session");
        }
    }

    /// Log in and publish the result.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AuthError> {
        let Ok(_guard) = self.mutation.try_lock() else {
            tracing::debug!("Rejecting login, another session change is running");
            return Err(AuthError::Busy("login"));
        };

        let previous = self.state();
        self.set_state(SessionState {
            status: SessionStatus::Authenticating,
            user: None,
        });

        match self.auth.login(credentials).await {
            Ok(outcome) => {
                self.set_state(SessionState::authenticated(outcome.user.clone()));
                Ok(outcome)
            }
            Err(AuthError::Validation(e)) => {
                // Rejected locally; nothing was sent or stored.
                self.set_state(previous);
                Err(e.into())
            }
            Err(e) => {
                // The stored session may have survived (outage before the
                // token was replaced); publish whatever the store now holds.
                let next = match self.auth.store().load().await {
                    Some(session) => SessionState::authenticated(session.user),
                    None => {
                        SessionState::with_status(SessionStatus::Error(e.user_message()))
                    }
                };
                self.set_state(next);
                Err(e)
            }
        }
    }

    /// Log out. Always ends `Unauthenticated`; a storage failure is still
    /// returned so the caller can report it.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.mutation.lock().await;
        let result = self.auth.logout().await;
        self.set_state(SessionState::with_status(SessionStatus::Unauthenticated));
        result
    }

    /// Re-fetch the profile while authenticated and publish it.
    pub async fn refresh_user(&self) -> Result<UserProfile, AuthError> {
        let _guard = self.mutation.lock().await;
        if !self.state().is_authenticated() {
            return Err(AuthError::Unauthorized);
        }

        match self.auth.refresh_user().await {
            Ok(user) => {
                self.set_state(SessionState::authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.set_state(SessionState::with_status(SessionStatus::Unauthenticated));
                }
                Err(e)
            }
        }
    }

    /// Ask the server whether the session is still valid and drop it if the
    /// server rejects it. Transport and server errors leave the session as
    /// it is and are returned.
    pub async fn verify(&self) -> Result<bool, AuthError> {
        let _guard = self.mutation.lock().await;
        if self.auth.check_session().await? {
            return Ok(true);
        }

        self.clear_quietly().await;
        self.expire();
        Ok(false)
    }

    /// Move an authenticated state to unauthenticated. Other states are
    /// left alone so a failed login keeps its error.
    fn expire(&self) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = SessionState::with_status(SessionStatus::Unauthenticated);
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!("Session invalidated");
        }
    }

    /// Follow invalidation events from the HTTP client until it goes away.
    pub fn spawn_invalidation_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.auth.api().subscribe();
        let context = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Invalidated) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Session event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                match context.upgrade() {
                    Some(context) => context.expire(),
                    None => break,
                }
            }
        })
    }
}

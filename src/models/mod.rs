// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the account API.

pub mod auth;
pub mod user;

pub use auth::{AuthResponse, Credentials};
pub use user::{RegisterRequest, UserProfile};

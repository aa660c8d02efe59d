// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - account API operations.

pub mod auth;

pub use auth::{AuthService, LoginOutcome};

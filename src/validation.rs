// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side validation for the sign-in and sign-up forms.
//!
//! Everything here runs before a request is built, so a rejected form never
//! reaches the network.

use crate::models::RegisterRequest;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Characters accepted as the "special" class of the password rule.
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

/// A field-level validation failure. The display text is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your full name (at least 2 characters).")]
    InvalidName,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password must be at least 8 characters and include uppercase, lowercase, number, and special character.")]
    WeakPassword,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Please enter your {0}.")]
    MissingField(&'static str),
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Password complexity: 8+ characters with lowercase, uppercase, digit and
/// a special character. Line breaks are never accepted.
///
/// Length is counted in UTF-16 code units, the way the app's form fields
/// count it, so an emoji counts as two.
pub fn is_strong_password(password: &str) -> bool {
    if password.encode_utf16().count() < MIN_PASSWORD_LEN
        || password.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
    {
        return false;
    }

    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if !is_strong_password(password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

/// Sign-up form as the user typed it.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Check the fields in screen order; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::InvalidName);
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }

    /// Validate and turn the form into a registration request.
    ///
    /// The email doubles as the login. The first word of the name becomes
    /// the first name, the remainder the last name.
    pub fn into_request(self) -> Result<RegisterRequest, ValidationError> {
        self.validate()?;

        let full_name = self.full_name.trim();
        let (first_name, last_name) = match full_name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (full_name.to_string(), String::new()),
        };

        Ok(RegisterRequest {
            login: self.email.clone(),
            email: self.email,
            password: self.password,
            first_name,
            last_name,
            lang_key: None,
            image_url: None,
        })
    }
}

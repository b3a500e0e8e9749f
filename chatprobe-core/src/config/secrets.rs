//! Secret handling for the probe's credential
//!
//! The bearer key is wrapped in [`SecretString`] from the moment it is read,
//! so neither `Debug` nor `Display` (and therefore no `tracing` field) can
//! print it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get a partially redacted version for debugging
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let len = self.value.chars().count();
        if len <= 8 {
            // Very short secrets get fully redacted
            "[REDACTED]".to_string()
        } else if self.value.starts_with("sk-") || self.value.starts_with("pk-") {
            format!("{}...{}", head(&self.value, 3), tail(&self.value, 4))
        } else {
            format!("{}...{}", head(&self.value, 2), tail(&self.value, 2))
        }
    }
}

fn head(value: &str, n: usize) -> String {
    value.chars().take(n).collect()
}

fn tail(value: &str, n: usize) -> String {
    let mut chars: Vec<char> = value.chars().rev().take(n).collect();
    chars.reverse();
    chars.into_iter().collect()
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A trait for types that can be logged safely
pub trait SafeLogging {
    /// Returns a safe version for logging
    fn safe_for_logging(&self) -> String;
}

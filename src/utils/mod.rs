//! Utility functions and helpers.

pub mod http;

/// Mask a secret for logging, keeping only its length.
pub fn redact(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

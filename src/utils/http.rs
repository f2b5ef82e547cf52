// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::WatcherConfig;

/// Create a configured asynchronous HTTP client.
///
/// Redirects follow reqwest's default policy; the request is bounded by
/// `timeout_secs` end to end.
pub fn create_async_client(config: &WatcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

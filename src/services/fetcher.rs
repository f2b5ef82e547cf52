// src/services/fetcher.rs

//! Page fetcher.
//!
//! Issues a single GET against the processing-times page. Only HTTP 200
//! counts as success; there is no retry.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use crate::error::{AppError, Result};
use crate::models::WatcherConfig;
use crate::utils::http::create_async_client;

/// Source of the raw page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Location being fetched, for log messages.
    fn url(&self) -> &str;

    /// Fetch the page body.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the page over HTTP.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    /// Create a fetcher with the configured URL, User-Agent and timeout.
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String> {
        let transport_err = |e: reqwest::Error| {
            error!("Failed to fetch webpage content from {}: {}", self.url, e);
            AppError::FetchTransport {
                url: self.url.clone(),
                message: e.to_string(),
            }
        };

        let response = self.client.get(&self.url).send().await.map_err(transport_err)?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                "Failed to fetch webpage content from {}, Return Code {}",
                self.url,
                status.as_u16()
            );
            return Err(AppError::FetchStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(transport_err)?;
        debug!("Fetched {} bytes from {}", text.len(), self.url);
        Ok(text)
    }
}

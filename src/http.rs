//! HTTP verification of running sample containers
//!
//! This module provides a small HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry for connection errors and 5xx responses
//! - Immediate failure on 4xx responses

use crate::error::HttpError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("image-harness/", env!("CARGO_PKG_VERSION"));

/// Maximum number of attempts, including the first
const MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry; doubles for each further retry
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Checks that a URL answers successfully
#[async_trait]
pub trait EndpointVerifier: Send + Sync {
    /// Returns the HTTP status of the first successful response
    async fn verify(&self, url: &str) -> Result<u16, HttpError>;
}

/// HTTP client wrapper with retry logic
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_attempts: u32,
    base_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::request("", format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
        })
    }

    /// Set the number of attempts and the first retry delay
    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl EndpointVerifier for HttpClient {
    async fn verify(&self, url: &str) -> Result<u16, HttpError> {
        let mut delay = self.base_delay;
        let mut attempt = 1;

        loop {
            let error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::debug!(url, status = status.as_u16(), "endpoint verified");
                        return Ok(status.as_u16());
                    }
                    let error = HttpError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_timeout() => HttpError::timeout(url),
                Err(e) => HttpError::request(url, e.to_string()),
            };

            if attempt >= self.max_attempts {
                return Err(error);
            }

            tracing::warn!(url, attempt, "{}, retrying in {:?}", error, delay);
            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }
}

//! HTTP access to a registry REST endpoint.
//!
//! Registries are read-only list endpoints authenticated with a raw token in
//! the `Authorization` header. A failed request is an error, never an empty
//! list.

use std::time::Duration;

use serde_json::Value;

use crate::config::Endpoint;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The registry answered with a non-2xx status code.
    #[error("Registry returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body was not the expected JSON list.
    #[error("Invalid registry response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Unknown registry: {0}")]
    UnknownRegistry(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// RegistryClient
// ---------------------------------------------------------------------------

/// A configured client for one registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    name: &'static str,
    endpoint: Endpoint,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(
        name: &'static str,
        endpoint: Endpoint,
        timeout_secs: u64,
    ) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            name,
            endpoint,
            http,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Full URL for a path below the entrypoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.url, path)
    }

    /// GET a JSON list and return its raw elements.
    ///
    /// Elements are decoded by the caller one at a time, see
    /// [`crate::records::decode_each`].
    pub async fn fetch_records(&self, path: &str) -> Result<Vec<Value>, RegistryError> {
        self.request_list(path).await.inspect_err(|e| {
            tracing::warn!(registry = self.name, error = %e, "Error contacting registry");
        })
    }

    async fn request_list(&self, path: &str) -> Result<Vec<Value>, RegistryError> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.endpoint.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let items: Vec<Value> = serde_json::from_slice(&body).map_err(|e| RegistryError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(registry = self.name, url, count = items.len(), "Registry list fetched");
        Ok(items)
    }
}

//! Remote metadata service access.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::error::RemoteError;
use super::models::{AlbumPage, ArtistPage};

/// Fetch-by-id access to remote artist and album pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_artist(&self, id: &str) -> Result<ArtistPage, RemoteError>;

    async fn fetch_album(&self, id: &str) -> Result<AlbumPage, RemoteError>;
}

/// HTTP client for the metadata service.
pub struct HttpMetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataClient {
    /// Create a new metadata client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the metadata service (e.g., "http://localhost:8080")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
        id: &str,
    ) -> Result<T, RemoteError> {
        let url = format!("{}/{}/{}", self.base_url, what, id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::not_found(what, id));
        }
        if !status.is_success() {
            // The body may carry the service's own error marker, keep it in the reason
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::new(format!(
                "Failed to fetch {} {}: status {} {}",
                what, id, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::new(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl MetadataProvider for HttpMetadataClient {
    async fn fetch_artist(&self, id: &str) -> Result<ArtistPage, RemoteError> {
        self.get_page("artist", id).await
    }

    async fn fetch_album(&self, id: &str) -> Result<AlbumPage, RemoteError> {
        self.get_page("album", id).await
    }
}

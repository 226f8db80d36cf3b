use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Free-text photo search
///
/// Implementations swallow their own failures: every problem is reported as
/// `None`, never as an error to the caller.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Option<String>;
}

/// Errors that can occur when talking to Unsplash
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Unsplash search API client
pub struct UnsplashClient {
    base_url: String,
    access_key: Option<String>,
    client: Client,
}

impl UnsplashClient {
    /// Create a new Unsplash client
    ///
    /// Without an access key every search resolves to `None` immediately.
    pub fn new(base_url: String, access_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            access_key: access_key.filter(|k| !k.is_empty()),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_key.is_some()
    }

    /// Fetch the first landscape photo URL for a query
    pub async fn first_photo(&self, access_key: &str, query: &str) -> Result<Option<String>, PhotoError> {
        let url = format!("{}/search/photos", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .header("Authorization", format!("Client-ID {}", access_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PhotoError::ApiError(format!(
                "Photo search failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let results = json
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| PhotoError::InvalidResponse("Missing results array".into()))?;

        Ok(results
            .first()
            .and_then(|photo| photo.pointer("/urls/regular"))
            .and_then(|u| u.as_str())
            .map(str::to_string))
    }
}

#[async_trait]
impl PhotoSearch for UnsplashClient {
    async fn search(&self, query: &str) -> Option<String> {
        let access_key = match &self.access_key {
            Some(key) => key,
            None => {
                tracing::trace!("Photo search skipped, no access key configured");
                return None;
            }
        };

        match self.first_photo(access_key, query).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Error fetching image for '{}': {}", query, e);
                None
            }
        }
    }
}

/// Photo search that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPhotos;

#[async_trait]
impl PhotoSearch for NoPhotos {
    async fn search(&self, _query: &str) -> Option<String> {
        None
    }
}

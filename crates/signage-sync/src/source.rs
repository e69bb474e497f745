//! Where a branch pulls its slides from.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use signage_types::{endpoints, SlideId, SlideListing};

use crate::error::{SyncError, SyncResult};

/// Read-only view of the distribution service's inventory.
#[async_trait]
pub trait SlideSource: Send + Sync {
    async fn list_slides(&self) -> SyncResult<SlideListing>;
    async fn fetch_slide(&self, id: &SlideId) -> SyncResult<Bytes>;
}

/// [`SlideSource`] over the distribution service's HTTP API.
#[derive(Clone, Debug)]
pub struct HttpSlideSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSlideSource {
    pub fn new(base: Url, timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> SyncResult<Url> {
        self.base
            .join(path)
            .map_err(|e| SyncError::Config(format!("{}{path}: {e}", self.base)))
    }

    async fn get(&self, url: Url) -> SyncResult<Bytes> {
        let transport = |e: reqwest::Error| SyncError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(transport)
    }
}

#[async_trait]
impl SlideSource for HttpSlideSource {
    async fn list_slides(&self) -> SyncResult<SlideListing> {
        let body = self.get(self.url(endpoints::SLIDES)?).await?;
        serde_json::from_slice(&body).map_err(|e| SyncError::InvalidListing(e.to_string()))
    }

    async fn fetch_slide(&self, id: &SlideId) -> SyncResult<Bytes> {
        let path = format!("{}/{}", endpoints::SLIDES, id.file_name());
        self.get(self.url(&path)?).await
    }
}

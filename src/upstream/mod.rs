//! Upstream directory client
//!
//! Outbound HTTP to the directory service that owns ground-truth avatar
//! data. The pipeline only sees the [`UpstreamClient`] trait, so tests swap
//! in a canned implementation and the real one stays thin: one REST lookup
//! for user state, one plain GET for proxy-mode image bytes. Every call has
//! a bounded timeout; a timeout surfaces as an error, never a hang.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::UpstreamConfig;
use crate::errors::UpstreamError;
use crate::models::{AvatarDescriptor, UpstreamUser};

/// Image bytes fetched on behalf of a client in proxy response mode.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Boundary to the upstream directory service.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch ground-truth avatar state for a user.
    async fn fetch_user(&self, user_id: &str) -> Result<AvatarDescriptor, UpstreamError>;

    /// Fetch raw image bytes from a resolved avatar URL.
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, UpstreamError>;
}

/// `reqwest`-backed client for the directory REST API.
pub struct DirectoryClient {
    http: reqwest::Client,
    api_base: String,
    auth_header: String,
}

impl DirectoryClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_header: format!("Bot {}", config.token),
        })
    }
}

#[async_trait]
impl UpstreamClient for DirectoryClient {
    async fn fetch_user(&self, user_id: &str) -> Result<AvatarDescriptor, UpstreamError> {
        let url = format!("{}/users/{}", self.api_base, user_id);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|e| UpstreamError::from_request_error(e, &url))?;

        match response.status() {
            status if status.is_success() => {
                let user: UpstreamUser = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::decode(e.to_string()))?;
                Ok(user.into())
            }
            StatusCode::NOT_FOUND => Err(UpstreamError::MissingUser),
            status => Err(UpstreamError::Http {
                status: status.as_u16(),
            }),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, UpstreamError> {
        // CDN URLs are public; no credential is attached.
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_request_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_request_error(e, url))?;

        Ok(FetchedImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

//! Avatar resolution pipeline
//!
//! Orchestrates a single request end to end: validate the identifier, run
//! admission control, consult the cache, fetch from the upstream on a miss,
//! and build the final URL from the descriptor plus per-request hints.
//!
//! On a miss the fetched descriptor is written to the cache before the
//! response value is constructed, so the write survives even if the response
//! never reaches the client. Concurrent misses for the same identifier each
//! fetch independently; the cache's last-write-wins insert keeps the end
//! state consistent either way.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::avatar_url;
use crate::cache::AvatarCache;
use crate::config::Config;
use crate::errors::{AppError, AppResult, UpstreamError};
use crate::models::{AvatarDescriptor, AvatarQuery, ResolvedAvatar};
use crate::rate_limit::FixedWindowLimiter;
use crate::upstream::{FetchedImage, UpstreamClient};

/// Resolution pipeline, constructed once at startup and shared by every
/// request.
pub struct AvatarResolver {
    cache: AvatarCache,
    limiter: FixedWindowLimiter,
    upstream: Arc<dyn UpstreamClient>,
    cdn_base: String,
    custom_avatar_ttl: Duration,
    default_avatar_ttl: Duration,
}

impl AvatarResolver {
    pub fn new(
        cache: AvatarCache,
        limiter: FixedWindowLimiter,
        upstream: Arc<dyn UpstreamClient>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            limiter,
            upstream,
            cdn_base: config.upstream.cdn_base.clone(),
            custom_avatar_ttl: config.cache.custom_avatar_ttl(),
            default_avatar_ttl: config.cache.default_avatar_ttl(),
        }
    }

    /// Resolve `user_id` to an avatar URL for one client request.
    ///
    /// `client_key` is the admission-control identity derived by the HTTP
    /// layer; `None` means the caller could not be identified and the request
    /// is refused outright.
    pub async fn resolve(
        &self,
        client_key: Option<&str>,
        user_id: &str,
        query: &AvatarQuery,
    ) -> AppResult<ResolvedAvatar> {
        if !avatar_url::is_valid_user_id(user_id) {
            return Err(AppError::bad_request(
                "user id must be a 17-21 digit decimal string",
            ));
        }

        let Some(client_key) = client_key else {
            return Err(AppError::ClientUnidentified);
        };
        if !self.limiter.try_admit(client_key).is_allowed() {
            return Err(AppError::RateLimited);
        }

        let descriptor = match self.cache.get(user_id) {
            Some(descriptor) => {
                debug!(user_id, "avatar cache hit");
                descriptor
            }
            None => self.fetch_and_cache(user_id).await?,
        };

        let location = match &descriptor.avatar_hash {
            Some(hash) => avatar_url::custom_avatar_url(
                &self.cdn_base,
                user_id,
                hash,
                query.size.as_deref(),
                query.extension.as_deref(),
            ),
            None => avatar_url::default_avatar_url(&self.cdn_base, user_id),
        };

        Ok(ResolvedAvatar {
            location,
            max_age: self.ttl_for(&descriptor),
        })
    }

    /// Fetch image bytes for proxy-mode responses.
    pub async fn fetch_image(&self, url: &str) -> AppResult<FetchedImage> {
        self.upstream.fetch_image(url).await.map_err(|error| {
            warn!(url, %error, "proxy-mode image fetch failed");
            AppError::Upstream(error)
        })
    }

    async fn fetch_and_cache(&self, user_id: &str) -> AppResult<AvatarDescriptor> {
        let descriptor = match self.upstream.fetch_user(user_id).await {
            Ok(descriptor) => descriptor,
            // A missing user is a terminal answer for this request, but it is
            // never cached: only real descriptors enter the cache.
            Err(UpstreamError::MissingUser) => {
                debug!(user_id, "user not present upstream");
                return Err(AppError::not_found(user_id));
            }
            Err(error) => {
                warn!(user_id, stage = "upstream_fetch", %error, "avatar lookup failed");
                return Err(AppError::Upstream(error));
            }
        };

        // Written before the response is built, so the entry sticks even if
        // the client has gone away by now.
        self.cache
            .insert(user_id, descriptor.clone(), self.ttl_for(&descriptor));
        debug!(
            user_id,
            custom = descriptor.has_custom_avatar(),
            "avatar cached"
        );

        Ok(descriptor)
    }

    /// TTL applied to a descriptor: custom avatars keep the long TTL, the
    /// "no avatar" answer expires sooner so a newly set avatar shows up.
    fn ttl_for(&self, descriptor: &AvatarDescriptor) -> Duration {
        if descriptor.has_custom_avatar() {
            self.custom_avatar_ttl
        } else {
            self.default_avatar_ttl
        }
    }

    /// Shared cache handle, exposed for maintenance sweeps.
    pub fn cache(&self) -> &AvatarCache {
        &self.cache
    }

    /// Shared limiter handle, exposed for maintenance sweeps.
    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }
}

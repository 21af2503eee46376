use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// How `GET /{id}` answers: redirect to the CDN URL, or fetch and relay
    /// the image bytes.
    pub response_mode: ResponseMode,
    /// Where `GET /` sends visitors.
    pub index_redirect: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Redirect,
    Proxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the directory REST API.
    pub api_base: String,
    /// Base URL of the image CDN the service points clients at.
    pub cdn_base: String,
    /// Bot credential for the directory API. Never logged.
    #[serde(default)]
    pub token: String,
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for a resolved custom avatar.
    pub custom_avatar_ttl_secs: u64,
    /// Shorter TTL for a "no custom avatar" result, so a newly set avatar
    /// propagates faster.
    pub default_avatar_ttl_secs: u64,
}

impl CacheConfig {
    pub fn custom_avatar_ttl(&self) -> Duration {
        Duration::from_secs(self.custom_avatar_ttl_secs)
    }

    pub fn default_avatar_ttl(&self) -> Duration {
        Duration::from_secs(self.default_avatar_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_millis: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                response_mode: ResponseMode::Redirect,
                index_redirect: "https://github.com/cdev-oss/discord-avatar".to_string(),
            },
            upstream: UpstreamConfig {
                api_base: "https://discord.com/api/v10".to_string(),
                cdn_base: "https://cdn.discordapp.com".to_string(),
                token: String::new(),
                request_timeout_secs: 10,
            },
            cache: CacheConfig {
                custom_avatar_ttl_secs: 3600,
                default_avatar_ttl_secs: 900,
            },
            rate_limit: RateLimitConfig {
                max_requests: 6,
                window_millis: 7_500,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        let mut config: Self = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            default_config
        };

        // The credential lives in the environment, not on disk.
        if let Ok(token) = std::env::var("UPSTREAM_TOKEN") {
            config.upstream.token = token;
        }

        Ok(config)
    }
}

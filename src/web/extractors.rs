//! Request extractors
//!
//! Derives the per-client admission key from the request. The resolution
//! order mirrors the edge deployment: `cf-connecting-ip` when fronted by
//! Cloudflare, then the first `x-forwarded-for` entry, then the connection
//! peer address. `None` means the caller cannot be identified; admission
//! fails closed on that.

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Client identity used as the rate-limiter key.
#[derive(Debug, Clone)]
pub struct ClientKey(pub Option<String>);

impl ClientKey {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Strip a trailing `:port` from a forwarded address, e.g. `1.2.3.4:5678`.
fn strip_port(address: &str) -> &str {
    match address.rsplit_once(':') {
        Some((host, port))
            if !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => address,
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_cloudflare = header_value(&parts.headers, "cf-connecting-ip");

        let from_forwarded = header_value(&parts.headers, "x-forwarded-for")
            .and_then(|chain| {
                chain
                    .split(',')
                    .next()
                    .map(|first| strip_port(first.trim()).to_string())
            })
            .filter(|value| !value.is_empty());

        // Read the connection info extension directly instead of the
        // ConnectInfo extractor so requests without it (tests driving the
        // router via oneshot) fall through to None.
        let from_peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string());

        Ok(ClientKey(
            from_cloudflare.or(from_forwarded).or(from_peer),
        ))
    }
}

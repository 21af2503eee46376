use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use avatar_proxy::{
    cache::AvatarCache,
    config::{Config, ResponseMode},
    errors::UpstreamError,
    models::AvatarDescriptor,
    rate_limit::FixedWindowLimiter,
    services::AvatarResolver,
    upstream::{FetchedImage, UpstreamClient},
    utils::time::SharedClock,
    web::{AppState, WebServer},
};

const USER_ID: &str = "123456789012345678";
const CLIENT_IP: &str = "203.0.113.9";

/// Canned upstream: a map of user id to optional avatar hash. Unknown ids
/// answer as missing users.
struct StaticUpstream {
    users: HashMap<String, Option<String>>,
}

impl StaticUpstream {
    fn with_user(user_id: &str, hash: Option<&str>) -> Arc<Self> {
        let mut users = HashMap::new();
        users.insert(user_id.to_string(), hash.map(String::from));
        Arc::new(Self { users })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            users: HashMap::new(),
        })
    }
}

#[async_trait::async_trait]
impl UpstreamClient for StaticUpstream {
    async fn fetch_user(&self, user_id: &str) -> Result<AvatarDescriptor, UpstreamError> {
        match self.users.get(user_id) {
            Some(hash) => Ok(AvatarDescriptor::new(user_id, hash.clone())),
            None => Err(UpstreamError::MissingUser),
        }
    }

    async fn fetch_image(&self, _url: &str) -> Result<FetchedImage, UpstreamError> {
        Ok(FetchedImage {
            content_type: "image/png".to_string(),
            bytes: b"\x89PNG".to_vec(),
        })
    }
}

struct BrokenUpstream;

#[async_trait::async_trait]
impl UpstreamClient for BrokenUpstream {
    async fn fetch_user(&self, _user_id: &str) -> Result<AvatarDescriptor, UpstreamError> {
        Err(UpstreamError::Http { status: 503 })
    }

    async fn fetch_image(&self, _url: &str) -> Result<FetchedImage, UpstreamError> {
        Err(UpstreamError::Http { status: 503 })
    }
}

fn build_app(config: Config, upstream: Arc<dyn UpstreamClient>) -> Router {
    let clock: SharedClock = avatar_proxy::utils::time::system_clock();
    let cache = AvatarCache::new(clock.clone());
    let limiter = FixedWindowLimiter::new(
        config.rate_limit.max_requests,
        config.rate_limit.window(),
        clock,
    );
    let resolver = Arc::new(AvatarResolver::new(cache, limiter, upstream, &config));

    WebServer::router(AppState {
        config: Arc::new(config),
        resolver,
    })
}

fn default_app(upstream: Arc<dyn UpstreamClient>) -> Router {
    build_app(Config::default(), upstream)
}

async fn send_request(app: &Router, uri: &str, client_ip: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    let request = builder.body(Body::empty()).unwrap();

    app.clone().oneshot(request).await.unwrap()
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn custom_avatar_redirects_to_cdn_url() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = header(&response, "location").unwrap();
    assert!(
        location.contains("avatars/123456789012345678/abc123.png?size=4096"),
        "unexpected location: {location}"
    );
    assert_eq!(
        header(&response, "cache-control"),
        Some("public, max-age=3600")
    );
}

#[tokio::test]
async fn missing_avatar_redirects_to_default_slot() {
    let app = default_app(StaticUpstream::with_user(USER_ID, None));

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    // (123456789012345678 >> 22) % 6 == 5
    let location = header(&response, "location").unwrap();
    assert!(
        location.ends_with("/embed/avatars/5.png"),
        "unexpected location: {location}"
    );
    assert_eq!(
        header(&response, "cache-control"),
        Some("public, max-age=900")
    );
}

#[tokio::test]
async fn size_and_type_hints_shape_the_redirect() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    let response = send_request(
        &app,
        &format!("/{USER_ID}?size=1024&type=webp"),
        Some(CLIENT_IP),
    )
    .await;
    let location = header(&response, "location").unwrap();
    assert!(location.contains("abc123.webp?size=1024"));

    // Invalid hints fall back rather than failing.
    let response = send_request(
        &app,
        &format!("/{USER_ID}?size=100&type=bmp"),
        Some(CLIENT_IP),
    )
    .await;
    let location = header(&response, "location").unwrap();
    assert!(location.contains("abc123.png?size=4096"));
}

#[tokio::test]
async fn malformed_user_id_is_bad_request() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    for uri in ["/abc", "/1234", "/12345678901234567a"] {
        let response = send_request(&app, uri, Some(CLIENT_IP)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
    }
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = default_app(StaticUpstream::empty());

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = default_app(Arc::new(BrokenUpstream));

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn seventh_request_in_window_is_rate_limited() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    for i in 0..6 {
        let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;
        assert_eq!(response.status(), StatusCode::FOUND, "request {}", i + 1);
    }

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty(), "429 carries no body");

    // A different client is unaffected.
    let response = send_request(&app, &format!("/{USER_ID}"), Some("198.51.100.1")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn unidentifiable_client_is_forbidden() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    let response = send_request(&app, &format!("/{USER_ID}"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn proxy_mode_relays_image_bytes() {
    let mut config = Config::default();
    config.web.response_mode = ResponseMode::Proxy;
    let app = build_app(config, StaticUpstream::with_user(USER_ID, Some("abc123")));

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/png"));
    assert_eq!(
        header(&response, "cache-control"),
        Some("public, max-age=3600")
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], &b"\x89PNG"[..]);
}

#[tokio::test]
async fn index_redirects_to_project_page() {
    let app = default_app(StaticUpstream::empty());

    let response = send_request(&app, "/", Some(CLIENT_IP)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header(&response, "location"),
        Some("https://github.com/cdev-oss/discord-avatar")
    );
}

#[tokio::test]
async fn favicon_is_no_content() {
    let app = default_app(StaticUpstream::empty());

    let response = send_request(&app, "/favicon.ico", Some(CLIENT_IP)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(header(&response, "cache-control").is_some());
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = default_app(StaticUpstream::with_user(USER_ID, Some("abc123")));

    let response = send_request(&app, &format!("/{USER_ID}"), Some(CLIENT_IP)).await;
    assert_eq!(
        header(&response, "cross-origin-resource-policy"),
        Some("cross-origin")
    );
    assert_eq!(header(&response, "x-content-type-options"), Some("nosniff"));
}

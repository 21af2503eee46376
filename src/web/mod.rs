//! Web layer module
//!
//! HTTP interface for the avatar proxy. Handlers stay thin and delegate to
//! the resolution pipeline; cross-cutting concerns (security headers,
//! request logging) live in middleware.

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{config::Config, services::AvatarResolver};

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use extractors::ClientKey;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, resolver: Arc<AvatarResolver>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = Self::router(AppState {
            config: Arc::new(config),
            resolver,
        });

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware.
    ///
    /// Public so integration tests can drive the exact production router
    /// without binding a socket.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/favicon.ico", get(handlers::favicon))
            .route("/:user_id", get(handlers::get_avatar))
            // Middleware (applied in reverse order)
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .layer(axum::middleware::from_fn(
                middleware::security_headers_middleware,
            ))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<AvatarResolver>,
}

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use avatar_proxy::{
    cache::AvatarCache,
    config::Config,
    rate_limit::FixedWindowLimiter,
    services::AvatarResolver,
    upstream::DirectoryClient,
    utils::time::system_clock,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "avatar-proxy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A caching avatar resolver edge service with per-client rate limiting")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = format!("avatar_proxy={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting avatar proxy v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    if config.upstream.token.is_empty() {
        info!("No upstream credential configured; directory lookups will be unauthenticated");
    }

    // Shared stores are built once here and injected into the pipeline.
    let clock = system_clock();
    let cache = AvatarCache::new(clock.clone());
    let limiter = FixedWindowLimiter::new(
        config.rate_limit.max_requests,
        config.rate_limit.window(),
        clock,
    );
    let upstream = Arc::new(DirectoryClient::new(&config.upstream)?);
    let resolver = Arc::new(AvatarResolver::new(cache, limiter, upstream, &config));
    info!(
        "Avatar resolver initialized (cache ttl {}s, {} requests per {}ms)",
        config.cache.custom_avatar_ttl_secs,
        config.rate_limit.max_requests,
        config.rate_limit.window_millis
    );

    let web_server = WebServer::new(config, resolver)?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}

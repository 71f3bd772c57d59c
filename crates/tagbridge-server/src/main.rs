//! tagbridge - RFID bridge between an ILS and reader middleware
//!
//! # Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:3000 with one simulated reader middleware
//! tagbridge
//!
//! # Custom configuration and port
//! tagbridge --config /etc/tagbridge.json --port 8080
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tagbridge_core::{BridgeConfig, LogLevel};
use tagbridge_server::{AppState, config, routes};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// RFID bridge between an integrated library system and reader middleware
#[derive(Parser, Debug)]
#[command(name = "tagbridge")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "TAGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(short, long, env = "TAGBRIDGE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// HTTP server port
    #[arg(short, long, env = "TAGBRIDGE_PORT", default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    init_tracing(&config);

    let state = Arc::new(AppState::from_config(&config));
    let app = routes::build_router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    info!("tagbridge v{}", tagbridge_core::VERSION);
    info!("HTTP server: http://{}", addr);
    for instance in &config.middleware_instances {
        info!(
            middleware_id = %instance.id,
            kind = %instance.kind(),
            url = instance.url.as_deref().unwrap_or("-"),
            "Middleware configured"
        );
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

/// Level from the configuration, then `LOG_LEVEL`, then `info`.
fn init_tracing(config: &BridgeConfig) {
    let from_env = std::env::var("LOG_LEVEL").ok();
    let level = LogLevel::resolve(
        [config.log_level.as_deref(), from_env.as_deref()],
        LogLevel::Info,
    );

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.as_directive()))
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

//! Waitlist signup service.
//!
//! A public signup endpoint hardened against automated abuse, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────┐
//!                        │                WAITLIST GATE                   │
//!                        │                                                │
//!   POST /api/waitlist   │  ┌────────┐   ┌──────────────────────────┐     │
//!   ─────────────────────┼─▶│  http  │──▶│        pipeline          │     │
//!                        │  │ server │   │ rate limit → bot →       │     │
//!                        │  └────────┘   │ honeypot → email → dedup │     │
//!                        │               └────────────┬─────────────┘     │
//!                        │                            │                   │
//!                        │                            ▼                   │
//!   GET /api/ping        │  ┌────────┐   ┌──────────────────────────┐     │
//!   ─────────────────────┼─▶│ keep-  │──▶│   persistence gateway    │────┼──── hosted
//!                        │  │ alive  │   │   (REST / memory)        │     │     table store
//!                        │  └────────┘   └──────────────────────────┘     │
//!                        │                                                │
//!                        │  ┌──────────────────────────────────────────┐  │
//!                        │  │          Cross-Cutting Concerns          │  │
//!                        │  │  config · observability · lifecycle      │  │
//!                        │  └──────────────────────────────────────────┘  │
//!                        └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use waitlist_gate::config::{self, WaitlistConfig};
use waitlist_gate::persistence::{Gateway, RestGateway};
use waitlist_gate::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "waitlist-gate", about = "Abuse-resistant waitlist signup service")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waitlist_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("waitlist-gate v0.1.0 starting");

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::finalize_config(WaitlistConfig::default())?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        store_configured = config.persistence.is_configured(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            waitlist_gate::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let gateway: Option<Arc<dyn Gateway>> = if config.persistence.is_configured() {
        let base_url = Url::parse(&config.persistence.url)?;
        Some(Arc::new(RestGateway::new(
            base_url,
            &config.persistence.service_key,
            Duration::from_secs(config.timeouts.store_secs),
            config.persistence.waitlist_table.clone(),
            config.persistence.security_table.clone(),
            config.persistence.ping_table.clone(),
        )?))
    } else {
        tracing::warn!("No store configured; running in degraded mode (simulated success)");
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config, gateway)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

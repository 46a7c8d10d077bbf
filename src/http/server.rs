//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the signup and keep-alive handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Assemble the pipeline from validated configuration
//! - Run the eviction sweeper alongside the server
//!
//! # Design Decisions
//! - The rate-limit table is owned here and passed into the pipeline
//!   explicitly; nothing in the service reaches for ambient global state
//! - The signup body is read as raw bytes and handed to the pipeline
//!   unparsed; parsing happens inside the pipeline after the rate-limit and
//!   bot stages, and an unreadable body maps to the generic 500 outcome
//!   instead of a framework rejection

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::WaitlistConfig;
use crate::http::keepalive::ping_handler;
use crate::http::request::{ClientIdentity, RequestUuid};
use crate::http::response::outcome_response;
use crate::lifecycle::Shutdown;
use crate::persistence::Gateway;
use crate::pipeline::Pipeline;
use crate::security::{rate_limit, AuditLogger, BotDetector, RateLimiter, RequestValidator};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub gateway: Option<Arc<dyn Gateway>>,
    pub keepalive_secret: String,
    pub geo_header: String,
}

/// HTTP server for the waitlist service.
pub struct HttpServer {
    router: Router,
    config: WaitlistConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Assemble the pipeline and router from a validated configuration.
    ///
    /// The only error path is pattern compilation, which `validate_config`
    /// has already ruled out for configs that went through the loader.
    pub fn new(
        config: WaitlistConfig,
        gateway: Option<Arc<dyn Gateway>>,
    ) -> Result<Self, regex::Error> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let pipeline = Arc::new(Pipeline::new(
            limiter.clone(),
            BotDetector::new(&config.bot)?,
            RequestValidator::new(&config.email)?,
            AuditLogger::new(gateway.clone()),
            gateway.clone(),
            config.email.security_score,
        ));

        let state = AppState {
            pipeline,
            gateway,
            keepalive_secret: config.keepalive.secret.clone(),
            geo_header: config.listener.geo_country_header.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &WaitlistConfig, state: AppState) -> Router {
        let mut router = Router::new().route("/api/waitlist", post(signup_handler));

        if config.keepalive.enabled {
            router = router.route("/api/ping", get(ping_handler).post(ping_handler));
        }

        router
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Eviction sweeper runs until the server stops.
        let shutdown = Shutdown::new();
        tokio::spawn(rate_limit::run_sweeper(
            self.limiter.clone(),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.handle(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        shutdown.trigger();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Signup handler: derive identity, hand the raw body to the pipeline.
async fn signup_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let identity = ClientIdentity::from_headers(&headers, &state.geo_header);
    let outcome = state.pipeline.submit(&body, identity).await;
    outcome_response(&outcome)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to install Ctrl+C handler");
        // Fall through and keep serving; the process can still be killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

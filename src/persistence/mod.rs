//! Persistence gateway subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline (dedup check, insert)  ──┐
//! security::audit (event insert)  ──┼──▶ Gateway trait ──▶ rest.rs (hosted table store)
//! http (keep-alive probe)         ──┘                 └──▶ memory.rs (local / tests)
//! ```
//!
//! # Design Decisions
//! - The store is optional end to end: `Option<Arc<dyn Gateway>>`. When absent
//!   the service runs in degraded mode (simulated success) instead of failing.
//! - Records are created once and never mutated by this service; the store
//!   owns them after insert.
//! - Audit and ping-log inserts are best-effort; callers discard their errors.

pub mod memory;
pub mod rest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryGateway;
pub use rest::RestGateway;

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Injected failure (memory backend, tests only).
    #[error("store unavailable")]
    Unavailable,
}

/// Row persisted for an accepted signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistRecord {
    /// Canonical (lower-cased) email, the dedup key.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    /// Two-letter country code when the geo hint was usable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Fixed score assigned to anything that passed the full pipeline.
    pub security_score: u32,
}

/// Category of a recorded security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RateLimit,
    BotDetected,
    Honeypot,
    SuspiciousEmail,
}

/// Audit row for a blocked (or otherwise noteworthy) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub ip_address: String,
    pub user_agent: String,
    pub event_type: EventType,
    /// Free-form diagnostic fields (reason, truncated email, ...).
    pub details: serde_json::Value,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// Build a blocked event with the standard fields filled in.
    pub fn blocked(
        ip: impl Into<String>,
        user_agent: impl Into<String>,
        event_type: EventType,
        details: serde_json::Value,
    ) -> Self {
        Self {
            ip_address: ip.into(),
            user_agent: user_agent.into(),
            event_type,
            details,
            blocked: true,
            created_at: Utc::now(),
        }
    }
}

/// Row recorded by the keep-alive endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingLog {
    pub pinged_at: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Contract the pipeline consumes from the durable store.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// from concurrent request handlers.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Whether a signup with this canonical email already exists.
    async fn exists(&self, email: &str) -> Result<bool, GatewayError>;

    /// Insert an accepted signup. At most one attempt per request.
    async fn insert(&self, record: &WaitlistRecord) -> Result<(), GatewayError>;

    /// Insert a security event. Callers treat failures as non-fatal.
    async fn record_event(&self, event: &SecurityEvent) -> Result<(), GatewayError>;

    /// Count waitlist rows; used by the keep-alive probe.
    async fn count(&self) -> Result<u64, GatewayError>;

    /// Insert a keep-alive log row. Best-effort.
    async fn log_ping(&self, log: &PingLog) -> Result<(), GatewayError>;
}

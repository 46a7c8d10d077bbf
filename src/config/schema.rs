//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so a minimal (or absent) file still boots.

use serde::{Deserialize, Serialize};

/// Root configuration for the waitlist service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WaitlistConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Bot heuristics (user-agent denylist, referer allowlist).
    pub bot: BotConfig,

    /// Email validation rules.
    pub email: EmailConfig,

    /// Durable store credentials and table names.
    pub persistence: PersistenceConfig,

    /// Keep-alive endpoint settings.
    pub keepalive: KeepaliveConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Header carrying the platform's country hint for accepted signups.
    pub geo_country_header: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 16 * 1024,
            geo_country_header: "x-vercel-ip-country".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Per-call timeout for the durable store in seconds.
    pub store_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            store_secs: 10,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Admitted requests per key per window. 0 disables the limiter.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// How often the eviction sweep runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 15 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

/// Bot detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// Case-insensitive patterns matched against the User-Agent header.
    pub user_agent_deny: Vec<String>,

    /// Origins that make a Referer header acceptable (substring match).
    pub referer_allow: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_agent_deny: vec![
                r"bot|crawler|spider|scraper".to_string(),
                r"curl|wget|python|php|java".to_string(),
                r"postman|insomnia|httpie".to_string(),
            ],
            referer_allow: vec![
                "localhost".to_string(),
                "vercel.app".to_string(),
                "scalptra.com".to_string(),
            ],
        }
    }
}

/// Email validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Case-insensitive patterns rejecting disposable/scripted addresses.
    pub deny_patterns: Vec<String>,

    /// Minimum accepted address length, inclusive.
    pub min_length: usize,

    /// Maximum accepted address length, inclusive.
    pub max_length: usize,

    /// Score stamped on records that passed the full pipeline.
    pub security_score: u32,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            deny_patterns: vec![
                r"^[a-z0-9]{32}@".to_string(),
                r"test\d+@".to_string(),
                r"temp|temporary|disposable".to_string(),
                r"10minutemail|guerrillamail|mailinator".to_string(),
            ],
            min_length: 5,
            max_length: 254,
            security_score: 100,
        }
    }
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Base URL of the hosted table store. Empty = degraded mode.
    pub url: String,

    /// Service-role key. Empty = read from `SUPABASE_SERVICE_ROLE_KEY`.
    pub service_key: String,

    pub waitlist_table: String,
    pub security_table: String,
    pub ping_table: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            waitlist_table: "waitlist".to_string(),
            security_table: "security_logs".to_string(),
            ping_table: "ping_logs".to_string(),
        }
    }
}

impl PersistenceConfig {
    /// Whether enough is present to talk to a real store. Placeholder URLs
    /// (scaffolding defaults) count as unconfigured.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.service_key.is_empty() && !self.url.contains("placeholder")
    }
}

/// Keep-alive endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Enable the `/api/ping` route.
    pub enabled: bool,

    /// Bearer secret. Empty = read from `CRON_SECRET`.
    pub secret: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: String::new(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Bind address for the metrics scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

//! Signup decision pipeline.
//!
//! # Data Flow
//! ```text
//! raw body + client identity
//!     → rate limit check
//!     → bot heuristics
//!     → body parse
//!     → honeypot check
//!     → email validation (canonicalize)
//!     → dedup check (store)
//!     → insert (store)
//!     → Outcome
//! ```
//!
//! # Design Decisions
//! - Linear state machine: any failing stage short-circuits to a terminal
//!   outcome, no branching back
//! - The body is parsed only after the rate-limit and bot stages have run,
//!   so malformed floods still consume quota and still hit the bot check
//! - Blocked stages record an audit event before returning; audit failures
//!   are swallowed inside `AuditLogger`
//! - Only the dedup check and the insert touch I/O; at most one insert
//!   attempt per request, no retries
//! - With no store configured the pipeline still runs every check and then
//!   reports a distinguishable degraded acceptance

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::http::request::{ClientIdentity, SignupRequest};
use crate::observability::metrics;
use crate::persistence::{EventType, Gateway, SecurityEvent, WaitlistRecord};
use crate::security::{AuditLogger, BotDetector, BotReason, EmailRejection, RateLimiter, RequestValidator};

/// Terminal result of running the pipeline for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Passed every check; `degraded` marks a simulated success with no store.
    Accepted { email: String, degraded: bool },
    /// Canonical email already registered. An idempotent success, not an error.
    AlreadyExists,
    RateLimited,
    BotDenied(BotReason),
    HoneypotTripped,
    MissingEmail,
    InvalidEmail(&'static str),
    /// The store failed during dedup or insert.
    StoreFailed,
    /// Unreadable request body or any fault caught at the outer boundary.
    Unexpected,
}

/// Orchestrates the abuse-prevention checks and persistence for signups.
pub struct Pipeline {
    limiter: Arc<RateLimiter>,
    detector: BotDetector,
    validator: RequestValidator,
    audit: AuditLogger,
    gateway: Option<Arc<dyn Gateway>>,
    security_score: u32,
}

impl Pipeline {
    pub fn new(
        limiter: Arc<RateLimiter>,
        detector: BotDetector,
        validator: RequestValidator,
        audit: AuditLogger,
        gateway: Option<Arc<dyn Gateway>>,
        security_score: u32,
    ) -> Self {
        Self {
            limiter,
            detector,
            validator,
            audit,
            gateway,
            security_score,
        }
    }

    /// Run the full decision pipeline for one submission.
    ///
    /// Takes the body raw: the cheap identity-based checks run before any
    /// parsing, matching the stage order `rate limit → bot → parse → ...`.
    pub async fn submit(&self, body: &[u8], identity: ClientIdentity) -> Outcome {
        if !self.limiter.admit(&identity.ip) {
            tracing::warn!(ip = %identity.ip, "rate limit exceeded");
            metrics::record_rejected("rate_limit");
            self.audit
                .record(SecurityEvent::blocked(
                    identity.ip.as_str(),
                    identity.user_agent.as_str(),
                    EventType::RateLimit,
                    json!({ "attempts": "exceeded" }),
                ))
                .await;
            return Outcome::RateLimited;
        }

        if let Some(reason) = self.detector.classify(&identity) {
            tracing::warn!(ip = %identity.ip, reason = reason.as_str(), "bot detected");
            metrics::record_rejected("bot");
            self.audit
                .record(SecurityEvent::blocked(
                    identity.ip.as_str(),
                    identity.user_agent.as_str(),
                    EventType::BotDetected,
                    json!({ "reason": reason.as_str() }),
                ))
                .await;
            return Outcome::BotDenied(reason);
        }

        let request: SignupRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(error) => {
                tracing::error!(error = %error, ip = %identity.ip, "unreadable signup body");
                metrics::record_rejected("body");
                return Outcome::Unexpected;
            }
        };

        if self.validator.honeypot_tripped(request.honeypot.as_deref()) {
            tracing::warn!(ip = %identity.ip, "honeypot triggered");
            metrics::record_rejected("honeypot");
            self.audit
                .record(SecurityEvent::blocked(
                    identity.ip.as_str(),
                    identity.user_agent.as_str(),
                    EventType::Honeypot,
                    json!({ "honeypot_value": request.honeypot.as_deref().unwrap_or_default() }),
                ))
                .await;
            return Outcome::HoneypotTripped;
        }

        let email = match self.validator.validate_email(request.email.as_deref()) {
            Ok(canonical) => canonical,
            Err(EmailRejection::Missing) => {
                metrics::record_rejected("missing_email");
                return Outcome::MissingEmail;
            }
            Err(EmailRejection::Invalid(reason)) => {
                tracing::warn!(ip = %identity.ip, reason, "invalid email");
                metrics::record_rejected("invalid_email");
                self.audit
                    .record(SecurityEvent::blocked(
                        identity.ip.as_str(),
                        identity.user_agent.as_str(),
                        EventType::SuspiciousEmail,
                        json!({
                            // Partial address only, for privacy.
                            "email": truncate_email(request.email.as_deref().unwrap_or_default()),
                            "reason": reason,
                        }),
                    ))
                    .await;
                return Outcome::InvalidEmail(reason);
            }
        };

        let Some(gateway) = &self.gateway else {
            tracing::info!(email = %email, "store unconfigured, simulating success");
            return Outcome::Accepted {
                email,
                degraded: true,
            };
        };

        match gateway.exists(&email).await {
            Ok(true) => return Outcome::AlreadyExists,
            Ok(false) => {}
            Err(error) => {
                tracing::error!(error = %error, "dedup check failed");
                metrics::record_rejected("store");
                return Outcome::StoreFailed;
            }
        }

        let record = WaitlistRecord {
            email: email.clone(),
            created_at: Utc::now(),
            ip_address: identity.ip.clone(),
            user_agent: identity.user_agent.clone(),
            referrer: identity.referer_or_direct().to_string(),
            country: normalize_country(identity.country_hint.as_deref()),
            security_score: self.security_score,
        };

        match gateway.insert(&record).await {
            Ok(()) => {
                tracing::info!(
                    email = %email,
                    ip = %identity.ip,
                    country = record.country.as_deref().unwrap_or("-"),
                    "new waitlist signup"
                );
                metrics::record_signup();
                Outcome::Accepted {
                    email,
                    degraded: false,
                }
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to save signup");
                metrics::record_rejected("store");
                Outcome::StoreFailed
            }
        }
    }
}

/// Accept only exact two-letter codes that are not the "unknown" sentinel.
fn normalize_country(hint: Option<&str>) -> Option<String> {
    let hint = hint?.trim();
    if hint.len() != 2 {
        return None;
    }
    let upper = hint.to_uppercase();
    if upper == "XX" {
        return None;
    }
    Some(upper)
}

fn truncate_email(email: &str) -> String {
    let head: String = email.chars().take(10).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::WaitlistConfig;
    use crate::persistence::MemoryGateway;

    fn pipeline(gateway: Option<Arc<MemoryGateway>>) -> Pipeline {
        let config = WaitlistConfig::default();
        let gateway: Option<Arc<dyn Gateway>> =
            gateway.map(|g| g as Arc<dyn Gateway>);
        Pipeline::new(
            Arc::new(RateLimiter::new(&config.rate_limit)),
            BotDetector::new(&config.bot).unwrap(),
            RequestValidator::new(&config.email).unwrap(),
            AuditLogger::new(gateway.clone()),
            gateway,
            config.email.security_score,
        )
    }

    fn human_identity(ip: &str) -> ClientIdentity {
        ClientIdentity {
            ip: ip.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            referer: "https://localhost:3000/".to_string(),
            country_hint: Some("US".to_string()),
        }
    }

    fn signup(email: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({ "email": email })).unwrap()
    }

    #[tokio::test]
    async fn test_accept_then_already_exists_for_case_variants() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        let outcome = pipeline
            .submit(&signup("Jane@Example.com"), human_identity("1.1.1.1"))
            .await;
        assert_eq!(
            outcome,
            Outcome::Accepted {
                email: "jane@example.com".to_string(),
                degraded: false
            }
        );

        let outcome = pipeline
            .submit(&signup("JANE@EXAMPLE.COM"), human_identity("1.1.1.2"))
            .await;
        assert_eq!(outcome, Outcome::AlreadyExists);
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_sixth_request_rate_limited_regardless_of_email() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        for i in 0..5 {
            let outcome = pipeline
                .submit(&signup(&format!("user{}@example.com", i)), human_identity("9.9.9.9"))
                .await;
            assert!(
                matches!(outcome, Outcome::Accepted { .. }),
                "request {} should be accepted, got {:?}",
                i + 1,
                outcome
            );
        }

        let outcome = pipeline
            .submit(&signup("perfectly.fine@example.com"), human_identity("9.9.9.9"))
            .await;
        assert_eq!(outcome, Outcome::RateLimited);

        let events = store.events();
        assert_eq!(events.last().unwrap().event_type, EventType::RateLimit);
        assert!(events.last().unwrap().blocked);
    }

    #[tokio::test]
    async fn test_bot_rejected_with_audit_event() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        let mut identity = human_identity("2.2.2.2");
        identity.user_agent.clear();

        let outcome = pipeline
            .submit(&signup("valid@example.com"), identity)
            .await;
        assert_eq!(outcome, Outcome::BotDenied(BotReason::MissingUserAgent));
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.events()[0].event_type, EventType::BotDetected);
    }

    #[tokio::test]
    async fn test_honeypot_beats_valid_email() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        let body =
            serde_json::to_vec(&json!({ "email": "valid@example.com", "honeypot": "filled-by-bot" }))
                .unwrap();
        let outcome = pipeline.submit(&body, human_identity("3.3.3.3")).await;
        assert_eq!(outcome, Outcome::HoneypotTripped);
        assert_eq!(store.events()[0].event_type, EventType::Honeypot);
    }

    #[tokio::test]
    async fn test_degraded_mode_still_runs_checks() {
        let pipeline = pipeline(None);

        let outcome = pipeline
            .submit(&signup("valid@example.com"), human_identity("4.4.4.4"))
            .await;
        assert_eq!(
            outcome,
            Outcome::Accepted {
                email: "valid@example.com".to_string(),
                degraded: true
            }
        );

        // A bot is still a bot without a store.
        let mut identity = human_identity("4.4.4.5");
        identity.user_agent = "curl/8.4.0".to_string();
        let outcome = pipeline.submit(&signup("valid2@example.com"), identity).await;
        assert_eq!(outcome, Outcome::BotDenied(BotReason::SuspiciousUserAgent));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_store_failed() {
        let store = Arc::new(MemoryGateway::new());
        store.fail_inserts(true);
        let pipeline = pipeline(Some(store.clone()));

        let outcome = pipeline
            .submit(&signup("valid@example.com"), human_identity("5.5.5.5"))
            .await;
        assert_eq!(outcome, Outcome::StoreFailed);
    }

    #[tokio::test]
    async fn test_audit_failure_never_changes_outcome() {
        let store = Arc::new(MemoryGateway::new());
        store.fail_events(true);
        let pipeline = pipeline(Some(store.clone()));

        let mut identity = human_identity("6.6.6.6");
        identity.user_agent.clear();
        let outcome = pipeline.submit(&signup("valid@example.com"), identity).await;
        assert_eq!(outcome, Outcome::BotDenied(BotReason::MissingUserAgent));

        // And a clean request still goes through.
        let outcome = pipeline
            .submit(&signup("valid@example.com"), human_identity("6.6.6.7"))
            .await;
        assert!(matches!(outcome, Outcome::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_missing_email_is_distinct_and_unaudited() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        let body = serde_json::to_vec(&json!({})).unwrap();
        let outcome = pipeline.submit(&body, human_identity("7.7.7.7")).await;
        assert_eq!(outcome, Outcome::MissingEmail);
        assert!(store.events().is_empty());

        let outcome = pipeline
            .submit(&signup("not-an-email"), human_identity("7.7.7.8"))
            .await;
        assert_eq!(outcome, Outcome::InvalidEmail("Invalid email format"));
        assert_eq!(store.events()[0].event_type, EventType::SuspiciousEmail);
    }

    #[tokio::test]
    async fn test_unreadable_body_runs_identity_checks_first() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        // A human identity with garbage JSON fails at the parse stage.
        let outcome = pipeline
            .submit(b"{not json", human_identity("8.8.8.8"))
            .await;
        assert_eq!(outcome, Outcome::Unexpected);

        // A scripted client is denied before the body is ever looked at.
        let mut identity = human_identity("8.8.8.9");
        identity.user_agent = "curl/8.4.0".to_string();
        let outcome = pipeline.submit(b"{not json", identity).await;
        assert_eq!(outcome, Outcome::BotDenied(BotReason::SuspiciousUserAgent));
        assert_eq!(store.events()[0].event_type, EventType::BotDetected);
    }

    #[tokio::test]
    async fn test_unreadable_bodies_consume_rate_limit_quota() {
        let store = Arc::new(MemoryGateway::new());
        let pipeline = pipeline(Some(store.clone()));

        for _ in 0..5 {
            let outcome = pipeline
                .submit(b"{not json", human_identity("10.10.10.10"))
                .await;
            assert_eq!(outcome, Outcome::Unexpected);
        }

        // The sixth attempt is limited even though no body ever parsed.
        let outcome = pipeline
            .submit(&signup("valid@example.com"), human_identity("10.10.10.10"))
            .await;
        assert_eq!(outcome, Outcome::RateLimited);
    }

    #[test]
    fn test_country_normalization() {
        assert_eq!(normalize_country(Some("us")), Some("US".to_string()));
        assert_eq!(normalize_country(Some("DE")), Some("DE".to_string()));
        assert_eq!(normalize_country(Some("XX")), None);
        assert_eq!(normalize_country(Some("USA")), None);
        assert_eq!(normalize_country(Some("")), None);
        assert_eq!(normalize_country(None), None);
    }
}

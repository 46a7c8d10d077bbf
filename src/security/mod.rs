//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (fixed-window counter per client key)
//!     → bot.rs (header heuristics)
//!     → validate.rs (honeypot, email rules)
//!     → audit.rs (best-effort event recording on rejection)
//! ```
//!
//! # Design Decisions
//! - Every check is cheap and deterministic; only audit touches I/O
//! - The rate-limit table is the only shared mutable state in the service
//! - Rejection messages stay vague; reasons live in the audit log, not the
//!   response body

pub mod audit;
pub mod bot;
pub mod rate_limit;
pub mod validate;

pub use audit::AuditLogger;
pub use bot::{BotDetector, BotReason};
pub use rate_limit::RateLimiter;
pub use validate::{EmailRejection, RequestValidator};

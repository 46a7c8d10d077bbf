//! Waitlist signup service library.
//!
//! The public signup endpoint runs a deterministic abuse-prevention
//! pipeline: rate limiting, bot heuristics, a honeypot field, email rules,
//! and deduplication against a hosted table store. Everything outside the
//! rate-limit table is stateless per request.

// Core subsystems
pub mod config;
pub mod http;
pub mod persistence;
pub mod pipeline;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::WaitlistConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Outcome, Pipeline};

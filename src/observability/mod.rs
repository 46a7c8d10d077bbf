//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`, initialized in `main`
//! - Metrics are cheap (atomic increments) and exposed on a separate
//!   listener so the public surface stays minimal

pub mod metrics;

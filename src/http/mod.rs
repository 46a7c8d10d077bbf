//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (identity extraction, body parsing, request ID)
//!     → pipeline (decision)
//!     → response.rs (outcome → status + JSON body)
//!
//! keepalive.rs handles /api/ping independently (bearer auth + store probe).
//! ```

pub mod keepalive;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientIdentity, SignupRequest};
pub use server::HttpServer;

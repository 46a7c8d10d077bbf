//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Build gateway + pipeline → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → stop accepting → broadcast to background tasks → exit
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownHandle};

//! Best-effort security event recording.
//!
//! # Design Decisions
//! - Failures writing an audit event are logged and discarded; they never
//!   change the outcome already determined for the triggering request
//! - No-op when the store is unconfigured

use std::sync::Arc;

use crate::persistence::{Gateway, SecurityEvent};

#[derive(Clone)]
pub struct AuditLogger {
    gateway: Option<Arc<dyn Gateway>>,
}

impl AuditLogger {
    pub fn new(gateway: Option<Arc<dyn Gateway>>) -> Self {
        Self { gateway }
    }

    /// Record an event, swallowing any store error.
    pub async fn record(&self, event: SecurityEvent) {
        let Some(gateway) = &self.gateway else {
            return;
        };

        if let Err(error) = gateway.record_event(&event).await {
            tracing::warn!(
                error = %error,
                event_type = ?event.event_type,
                ip = %event.ip_address,
                "failed to record security event"
            );
        }
    }
}

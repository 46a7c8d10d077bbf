//! Metrics collection and exposition.
//!
//! # Metrics
//! - `waitlist_signups_total` (counter): accepted signups
//! - `waitlist_rejected_total` (counter): rejections by pipeline stage
//! - `waitlist_ping_total` (counter): keep-alive probes by status
//!
//! # Design Decisions
//! - The `metrics` macros are no-ops until an exporter is installed, so the
//!   pipeline can record unconditionally
//! - Labels carry the stage name only; emails and IPs never become labels

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!("waitlist_signups_total", "Accepted signups");
            describe_counter!(
                "waitlist_rejected_total",
                "Requests rejected, labelled by pipeline stage"
            );
            describe_counter!("waitlist_ping_total", "Keep-alive probes by status");
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to install metrics exporter");
        }
    }
}

pub fn record_signup() {
    counter!("waitlist_signups_total").increment(1);
}

pub fn record_rejected(stage: &'static str) {
    counter!("waitlist_rejected_total", "stage" => stage).increment(1);
}

pub fn record_ping(ok: bool) {
    let status = if ok { "success" } else { "failed" };
    counter!("waitlist_ping_total", "status" => status).increment(1);
}

//! Keep-alive endpoint.
//!
//! Hosted stores pause free projects after a period of inactivity; a
//! scheduled job hits this route to keep the project warm. Guarded by a
//! bearer secret so it cannot be used as a free existence probe.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::persistence::PingLog;

pub async fn ping_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", state.keepalive_secret));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let Some(gateway) = &state.gateway else {
        return (
            StatusCode::OK,
            Json(json!({
                "message": "Ping successful (Demo mode - store not configured)",
                "timestamp": Utc::now(),
            })),
        )
            .into_response();
    };

    match gateway.count().await {
        Ok(count) => {
            metrics::record_ping(true);
            let log = PingLog {
                pinged_at: Utc::now(),
                status: "success".to_string(),
                error_message: None,
            };
            if let Err(error) = gateway.log_ping(&log).await {
                tracing::warn!(error = %error, "failed to record ping log");
            }
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Ping successful",
                    "timestamp": Utc::now(),
                    "count": count,
                })),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "keep-alive probe failed");
            metrics::record_ping(false);
            let log = PingLog {
                pinged_at: Utc::now(),
                status: "failed".to_string(),
                error_message: Some(error.to_string()),
            };
            if let Err(error) = gateway.log_ping(&log).await {
                tracing::warn!(error = %error, "failed to record ping log");
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Ping failed" })),
            )
                .into_response()
        }
    }
}

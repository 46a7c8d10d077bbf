//! Outcome-to-response mapping.
//!
//! # Responsibilities
//! - Map every pipeline outcome to its status code and JSON body
//!
//! # Design Decisions
//! - Abuse rejections (rate limit, bot, honeypot) share deliberately vague
//!   wording; detailed reasons go to the audit log only
//! - A duplicate signup is a 200 success, not an error
//! - Store failures return a generic message; the detail is logged server-side

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::Outcome;

/// Build the HTTP response for a pipeline outcome.
pub fn outcome_response(outcome: &Outcome) -> Response {
    match outcome {
        Outcome::Accepted { email, degraded } => {
            let message = if *degraded {
                "Successfully joined waitlist! (Demo mode - store not configured)"
            } else {
                "Successfully joined waitlist!"
            };
            (
                StatusCode::CREATED,
                Json(json!({ "message": message, "data": { "email": email } })),
            )
                .into_response()
        }
        Outcome::AlreadyExists => (
            StatusCode::OK,
            Json(json!({ "message": "Email already registered!" })),
        )
            .into_response(),
        Outcome::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests. Please try again later." })),
        )
            .into_response(),
        Outcome::BotDenied(_) | Outcome::HoneypotTripped => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Request blocked" })),
        )
            .into_response(),
        Outcome::MissingEmail => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email is required" })),
        )
            .into_response(),
        Outcome::InvalidEmail(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Please enter a valid email address" })),
        )
            .into_response(),
        Outcome::StoreFailed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to save email" })),
        )
            .into_response(),
        Outcome::Unexpected => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

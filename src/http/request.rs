//! Request parsing and identity extraction.
//!
//! # Responsibilities
//! - Derive the per-request client identity from headers
//! - Deserialize the signup body
//! - Generate unique request IDs for tracing
//!
//! # Design Decisions
//! - IP resolution order: first X-Forwarded-For entry → X-Real-IP →
//!   "unknown". These headers are client-supplied and spoofable; there is no
//!   reverse-proxy trust boundary here (known limitation, see DESIGN.md)
//! - Absent headers become empty strings so downstream checks stay pure
//!   string logic

use axum::http::{HeaderMap, HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Per-request client identity derived from headers.
///
/// Not cryptographically trustworthy: every field is attacker-controlled.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub ip: String,
    pub user_agent: String,
    pub referer: String,
    /// Two-letter country hint from the hosting platform, if present.
    pub country_hint: Option<String>,
}

impl ClientIdentity {
    pub fn from_headers(headers: &HeaderMap, geo_header: &str) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        };

        let forwarded = header("x-forwarded-for");
        let ip = forwarded
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let real_ip = header("x-real-ip").trim();
                (!real_ip.is_empty()).then(|| real_ip.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let country_hint = {
            let hint = header(geo_header).trim();
            (!hint.is_empty()).then(|| hint.to_string())
        };

        Self {
            ip,
            user_agent: header("user-agent").to_string(),
            referer: header("referer").to_string(),
            country_hint,
        }
    }

    /// Referer value as persisted: absent headers become "direct".
    pub fn referer_or_direct(&self) -> &str {
        if self.referer.is_empty() {
            "direct"
        } else {
            &self.referer
        }
    }
}

/// Signup request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    /// Hidden form field; any value here marks an automated submitter.
    pub honeypot: Option<String>,
}

/// UUID v4 request IDs for the `x-request-id` header.
#[derive(Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let identity = ClientIdentity::from_headers(
            &headers(&[
                ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
                ("x-real-ip", "198.51.100.2"),
            ]),
            "x-vercel-ip-country",
        );
        assert_eq!(identity.ip, "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let identity = ClientIdentity::from_headers(
            &headers(&[("x-real-ip", "198.51.100.2")]),
            "x-vercel-ip-country",
        );
        assert_eq!(identity.ip, "198.51.100.2");
    }

    #[test]
    fn test_unknown_when_no_ip_headers() {
        let identity = ClientIdentity::from_headers(&headers(&[]), "x-vercel-ip-country");
        assert_eq!(identity.ip, "unknown");
        assert_eq!(identity.user_agent, "");
        assert_eq!(identity.referer_or_direct(), "direct");
        assert_eq!(identity.country_hint, None);
    }

    #[test]
    fn test_geo_header_is_configurable() {
        let identity = ClientIdentity::from_headers(
            &headers(&[("cf-ipcountry", "DE")]),
            "cf-ipcountry",
        );
        assert_eq!(identity.country_hint.as_deref(), Some("DE"));
    }
}

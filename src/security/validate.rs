//! Honeypot and email validation.
//!
//! # Responsibilities
//! - Reject submissions that filled the hidden honeypot field
//! - Enforce email shape, length bounds, and the disposable/scripted denylist
//! - Produce the canonical (lower-cased) address used everywhere downstream
//!
//! # Design Decisions
//! - Missing email and invalid email are distinct rejections; the client can
//!   only correct what it is told about
//! - Denylist patterns are configuration, compiled once at startup
//! - Length runs before the shape check so absurd inputs get the cheaper,
//!   more specific reason

use regex::{Regex, RegexSet, RegexSetBuilder};

use crate::config::schema::EmailConfig;

/// Basic local-part@domain.tld shape.
const EMAIL_SHAPE: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Why an email was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailRejection {
    /// The field was absent or empty.
    Missing,
    /// The field was present but unacceptable; carries the internal reason.
    Invalid(&'static str),
}

/// Validator for the two submission-level checks.
pub struct RequestValidator {
    shape: Regex,
    deny: RegexSet,
    min_length: usize,
    max_length: usize,
}

impl RequestValidator {
    pub fn new(config: &EmailConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            shape: Regex::new(EMAIL_SHAPE)?,
            deny: RegexSetBuilder::new(&config.deny_patterns)
                .case_insensitive(true)
                .build()?,
            min_length: config.min_length,
            max_length: config.max_length,
        })
    }

    /// A non-empty honeypot value means an automated form fill.
    pub fn honeypot_tripped(&self, honeypot: Option<&str>) -> bool {
        honeypot.is_some_and(|value| !value.is_empty())
    }

    /// Validate and canonicalize an email. Returns the lower-cased address
    /// used as dedup key and storage value.
    pub fn validate_email(&self, email: Option<&str>) -> Result<String, EmailRejection> {
        let raw = email.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(EmailRejection::Missing);
        }

        let canonical = raw.to_lowercase();

        if canonical.len() < self.min_length || canonical.len() > self.max_length {
            return Err(EmailRejection::Invalid("Email length out of bounds"));
        }
        if !self.shape.is_match(&canonical) {
            return Err(EmailRejection::Invalid("Invalid email format"));
        }
        if self.deny.is_match(&canonical) {
            return Err(EmailRejection::Invalid("Suspicious email pattern"));
        }

        Ok(canonical)
    }
}

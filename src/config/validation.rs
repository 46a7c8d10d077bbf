//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every deny/allow pattern must compile before the service accepts traffic
//! - Validate value ranges (windows > 0, length bounds ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: WaitlistConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use regex::RegexSetBuilder;
use url::Url;

use crate::config::schema::WaitlistConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    BindAddress(String),

    #[error("rate_limit.window_secs must be > 0")]
    ZeroWindow,

    #[error("rate_limit.sweep_interval_secs must be > 0")]
    ZeroSweepInterval,

    #[error("email length bounds are inverted ({min} > {max})")]
    LengthBounds { min: usize, max: usize },

    #[error("invalid pattern in {list}: {source}")]
    Pattern {
        list: &'static str,
        source: regex::Error,
    },

    #[error("persistence.url '{0}' is not a valid http(s) URL")]
    StoreUrl(String),

    #[error("keepalive is enabled but no secret is configured")]
    MissingKeepaliveSecret,
}

/// Check everything serde cannot. Collects all problems before returning.
pub fn validate_config(config: &WaitlistConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.email.min_length > config.email.max_length {
        errors.push(ValidationError::LengthBounds {
            min: config.email.min_length,
            max: config.email.max_length,
        });
    }

    check_patterns(&config.bot.user_agent_deny, "bot.user_agent_deny", &mut errors);
    check_patterns(&config.email.deny_patterns, "email.deny_patterns", &mut errors);

    if config.persistence.is_configured() {
        match Url::parse(&config.persistence.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => errors.push(ValidationError::StoreUrl(config.persistence.url.clone())),
        }
    }

    if config.keepalive.enabled && config.keepalive.secret.is_empty() {
        errors.push(ValidationError::MissingKeepaliveSecret);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_patterns(patterns: &[String], list: &'static str, errors: &mut Vec<ValidationError>) {
    if let Err(source) = RegexSetBuilder::new(patterns).case_insensitive(true).build() {
        errors.push(ValidationError::Pattern { list, source });
    }
}

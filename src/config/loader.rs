//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::WaitlistConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WaitlistConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: WaitlistConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Validate an already-built configuration (defaults, tests).
pub fn finalize_config(mut config: WaitlistConfig) -> Result<WaitlistConfig, ConfigError> {
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Secrets stay out of config files; blank fields fall back to environment
/// variables, matching how the hosted deployment provides them.
fn apply_env_overrides(config: &mut WaitlistConfig) {
    if config.persistence.url.is_empty() {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            config.persistence.url = url;
        }
    }
    if config.persistence.service_key.is_empty() {
        if let Ok(key) = std::env::var("SUPABASE_SERVICE_ROLE_KEY") {
            config.persistence.service_key = key;
        }
    }
    if config.keepalive.secret.is_empty() {
        if let Ok(secret) = std::env::var("CRON_SECRET") {
            config.keepalive.secret = secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses() {
        let config: WaitlistConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.email.max_length, 254);
    }

    #[test]
    fn test_partial_section_overrides() {
        let config: WaitlistConfig = toml::from_str(
            r#"
            [rate_limit]
            max_requests = 10

            [listener]
            bind_address = "127.0.0.1:3000"
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.max_requests, 10);
        // Untouched fields keep their defaults.
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_unconfigured_persistence() {
        let config = WaitlistConfig::default();
        assert!(!config.persistence.is_configured());

        let mut config = WaitlistConfig::default();
        config.persistence.url = "https://placeholder.supabase.co".to_string();
        config.persistence.service_key = "key".to_string();
        assert!(!config.persistence.is_configured());
    }
}

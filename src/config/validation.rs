//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, quality 1-100, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }

    if !(1..=100).contains(&config.options.default_quality) {
        errors.push(ValidationError {
            field: "options.default_quality",
            message: format!("{} is outside 1..=100", config.options.default_quality),
        });
    }

    let timeouts = [
        ("timeouts.fetch_secs", config.timeouts.fetch_secs),
        ("timeouts.compress_secs", config.timeouts.compress_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError {
                field,
                message: "must be greater than zero".to_string(),
            });
        }
    }

    let inner = config
        .timeouts
        .fetch_secs
        .saturating_add(config.timeouts.compress_secs);
    if config.timeouts.request_secs <= inner {
        errors.push(ValidationError {
            field: "timeouts.request_secs",
            message: format!(
                "{} must be greater than fetch_secs + compress_secs ({})",
                config.timeouts.request_secs, inner
            ),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.options.default_quality = 0;
        config.timeouts.fetch_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "listener.bind_address");
        assert_eq!(errors[1].field, "options.default_quality");
        assert_eq!(errors[2].to_string(), "timeouts.fetch_secs: must be greater than zero");
    }

    #[test]
    fn test_request_timeout_must_exceed_inner_timeouts() {
        let mut config = ProxyConfig::default();
        config.timeouts.fetch_secs = 30;
        config.timeouts.compress_secs = 30;

        config.timeouts.request_secs = 60;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 1;
        config.timeouts.compress_secs = 3;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 61;
        config.timeouts.compress_secs = 30;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

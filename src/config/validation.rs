//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. Validation is a pure
//! function `&ClientConfig -> Result<(), Vec<ValidationError>>` and reports
//! every problem, not just the first.

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// Upper bound for `limits.max_head_bytes`.
pub const MAX_HEAD_BYTES_CEILING: usize = 1024 * 1024;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("default_port must not be 0")]
    ZeroDefaultPort,

    #[error("limits.{0} must be greater than 0")]
    ZeroLimit(&'static str),

    #[error("limits.max_head_bytes {0} exceeds the 1 MiB ceiling")]
    HeadLimitTooLarge(usize),

    #[error("logging.level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check `config` for out-of-range values.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.default_port == 0 {
        errors.push(ValidationError::ZeroDefaultPort);
    }
    if config.limits.max_head_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_head_bytes"));
    } else if config.limits.max_head_bytes > MAX_HEAD_BYTES_CEILING {
        errors.push(ValidationError::HeadLimitTooLarge(config.limits.max_head_bytes));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_body_bytes"));
    }
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
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
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ClientConfig::default();
        config.default_port = 0;
        config.limits.max_body_bytes = 0;
        config.limits.max_head_bytes = MAX_HEAD_BYTES_CEILING + 1;
        config.logging.level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroDefaultPort,
                ValidationError::HeadLimitTooLarge(MAX_HEAD_BYTES_CEILING + 1),
                ValidationError::ZeroLimit("max_body_bytes"),
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = ClientConfig::default();
        config.logging.level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }
}

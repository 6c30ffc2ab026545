//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::net::target::DEFAULT_PORT;

/// Root configuration for the SCGI client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Port for TCP addresses that carry none.
    pub default_port: u16,

    /// Reply size limits.
    pub limits: LimitsConfig,

    /// Logging settings (used by the CLI).
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Bounds on how much of a reply is buffered.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of the reply head (status line plus headers) in bytes.
    pub max_head_bytes: usize,

    /// Maximum size of the decoded reply body in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_head_bytes: 64 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.default_port, 80);
        assert_eq!(config.limits.max_head_bytes, 65536);
        assert_eq!(config.limits.max_body_bytes, 16 * 1024 * 1024);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            default_port = 9000

            [limits]
            max_body_bytes = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.default_port, 9000);
        assert_eq!(config.limits.max_body_bytes, 1024);
        assert_eq!(config.limits.max_head_bytes, 65536);
        assert_eq!(config.logging, LoggingConfig::default());
    }
}

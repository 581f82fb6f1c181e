//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AutoShutdownConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AutoShutdownConfig, ConfigError> {
    let config: AutoShutdownConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AutoShutdownConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [polling]
            interval_secs = 5
            unreachable_threshold_secs = 20

            [notice]
            locale = "en"
            "#,
        )
        .unwrap();
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.notice.locale, crate::lifecycle::Locale::En);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let err = parse_config("[idle]\nthreshold_secs = 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: idle.threshold_secs must be greater than zero"
        );

        let err = parse_config("[idle]\nthreshold_secs = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

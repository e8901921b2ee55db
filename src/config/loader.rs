//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::CuratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<CuratorConfig, ConfigError> {
    let config: CuratorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CuratorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;

    let lifecycle = &config.lifecycle;
    if lifecycle.delete_threshold <= lifecycle.skip_threshold {
        tracing::debug!(
            delete_threshold = lifecycle.delete_threshold,
            skip_threshold = lifecycle.skip_threshold,
            "Probed rules are evicted before they can enter the skip state"
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_surface() {
        let err = parse_config("[probe]\nconcurrency = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors[0].field, "probe.concurrency"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[probe\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/curator.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

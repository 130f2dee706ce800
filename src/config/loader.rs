//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_table() {
        let config = parse_config(
            r#"
            [timeouts]
            request_secs = 10

            [[services]]
            name = "file"
            base_url = "http://files.internal:8080"
            stream_prefixes = ["download/", "export/"]

            [[services]]
            name = "auth"
            base_url = "http://auth.internal"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeouts.request_secs, 10);
        assert_eq!(config.services.0[0].stream_prefixes, ["download/", "export/"]);
        assert_eq!(config.services.0[1].base_url, "http://auth.internal");
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [[services]]
            name = "a"
            base_url = "not a url"

            [[services]]
            name = "A"
            base_url = "http://a"
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "), "{message}");
        assert!(message.contains("invalid base_url"), "{message}");
        assert!(message.contains("defined more than once"), "{message}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

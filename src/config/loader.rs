//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        clusters = config.clusters.len(),
        routes = config.routes.len(),
        "Configuration parsed"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [observability]
            log_level = "debug"

            [clusters.web]
            load_balancing_policy = "round_robin"

            [clusters.web.health_check]
            interval_secs = 15

            [clusters.web.destinations.d1]
            address = "http://10.0.0.1"
            host = "web.internal"

            [clusters.web.destinations.d1.metadata]
            zone = "eu-1"

            [clusters.web.destinations.d2]
            address = "http://10.0.0.2"

            [routes.all]
            cluster = "web"
            hosts = ["example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_level, "debug");
        let web = config.clusters.get("web").unwrap();
        assert_eq!(web.destinations.len(), 2);
        assert_eq!(web.health_check.as_ref().unwrap().interval_secs, 15);
        assert_eq!(web.health_check.as_ref().unwrap().path, "/health");

        let d1 = web.destinations.get("D1").unwrap();
        assert_eq!(d1.host.as_deref(), Some("web.internal"));
        assert_eq!(
            d1.metadata.as_ref().and_then(|m| m.get("zone")).map(String::as_str),
            Some("eu-1")
        );
        assert!(web.destinations.get("d2").unwrap().metadata.is_none());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = parse_config("").unwrap();
        assert!(config.clusters.is_empty());
        assert!(config.routes.is_empty());
        assert!(config.reload.watch);
    }

    #[test]
    fn test_case_duplicate_destinations_rejected() {
        let err = parse_config(
            r#"
            [clusters.web.destinations.d1]
            address = "http://10.0.0.1"
            [clusters.web.destinations.D1]
            address = "http://10.0.0.2"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{}", err);
    }

    #[test]
    fn test_validation_error_surfaces() {
        let err = parse_config(
            r#"
            [routes.r1]
            cluster = "missing"
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_absent_address_is_a_validation_error() {
        let err = parse_config(
            r#"
            [clusters.web.destinations.d1]
            host = "example.com"
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(
                errors,
                vec![ValidationError::MissingAddress {
                    cluster: "web".into(),
                    destination: "d1".into(),
                }]
            ),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

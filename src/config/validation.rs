//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing clusters)
//! - Validate destination addresses and health endpoints
//! - Validate value ranges (intervals and thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, so the entity model
//!   itself never has to reject a value

use thiserror::Error;
use url::Url;

use crate::config::schema::{HealthCheckConfig, ProxyConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("destination '{cluster}/{destination}' has no address")]
    MissingAddress { cluster: String, destination: String },

    #[error("destination '{cluster}/{destination}' has invalid {field} '{value}': {reason}")]
    InvalidUrl {
        cluster: String,
        destination: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("cluster '{cluster}' health check: {reason}")]
    InvalidHealthCheck { cluster: String, reason: String },

    #[error("route '{route}' does not name a cluster")]
    MissingCluster { route: String },

    #[error("route '{route}' references unknown cluster '{cluster}'")]
    UnknownCluster { route: String, cluster: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (cluster_name, cluster) in config.clusters.sorted() {
        if cluster_name.as_str().trim().is_empty() {
            errors.push(ValidationError::EmptyName { kind: "cluster" });
        }

        for (dest_name, dest) in cluster.destinations.sorted() {
            if dest_name.as_str().trim().is_empty() {
                errors.push(ValidationError::EmptyName { kind: "destination" });
            }

            if dest.address.trim().is_empty() {
                errors.push(ValidationError::MissingAddress {
                    cluster: cluster_name.to_string(),
                    destination: dest_name.to_string(),
                });
            } else if let Err(reason) = check_url(&dest.address) {
                errors.push(ValidationError::InvalidUrl {
                    cluster: cluster_name.to_string(),
                    destination: dest_name.to_string(),
                    field: "address",
                    value: dest.address.clone(),
                    reason,
                });
            }

            if let Some(health) = dest.health.as_deref() {
                if let Err(reason) = check_url(health) {
                    errors.push(ValidationError::InvalidUrl {
                        cluster: cluster_name.to_string(),
                        destination: dest_name.to_string(),
                        field: "health",
                        value: health.to_string(),
                        reason,
                    });
                }
            }
        }

        if let Some(health_check) = &cluster.health_check {
            for reason in check_health_check(health_check) {
                errors.push(ValidationError::InvalidHealthCheck {
                    cluster: cluster_name.to_string(),
                    reason,
                });
            }
        }
    }

    for (route_name, route) in config.routes.sorted() {
        if route_name.as_str().trim().is_empty() {
            errors.push(ValidationError::EmptyName { kind: "route" });
        }

        match route.cluster.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingCluster {
                route: route_name.to_string(),
            }),
            Some(cluster) if !config.clusters.contains(cluster) => {
                errors.push(ValidationError::UnknownCluster {
                    route: route_name.to_string(),
                    cluster: cluster.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

fn check_health_check(config: &HealthCheckConfig) -> Vec<String> {
    let mut reasons = Vec::new();
    if !config.enabled {
        return reasons;
    }
    if config.interval_secs == 0 {
        reasons.push("interval_secs must be greater than 0".to_string());
    }
    if config.timeout_secs == 0 {
        reasons.push("timeout_secs must be greater than 0".to_string());
    }
    if config.unhealthy_threshold == 0 || config.healthy_threshold == 0 {
        reasons.push("thresholds must be greater than 0".to_string());
    }
    if !config.path.starts_with('/') {
        reasons.push(format!("path '{}' must start with '/'", config.path));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    #[test]
    fn test_valid_config() {
        let config = parse_config(
            r#"
            [clusters.web.destinations.d1]
            address = "http://10.0.0.1:8080"
            health = "http://10.0.0.1:8081/health"

            [routes.main]
            cluster = "WEB"
            path_prefix = "/"
            "#,
        );
        assert!(config.is_ok(), "{:?}", config.err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.clusters = crate::config::Snapshot::from_entries([(
            "web",
            crate::config::ClusterConfig::new(
                crate::config::Snapshot::from_entries([
                    ("empty", crate::config::DestinationConfig::new("")),
                    ("bad", crate::config::DestinationConfig::new("ftp://10.0.0.1")),
                ])
                .unwrap(),
            )
            .with_health_check(HealthCheckConfig {
                interval_secs: 0,
                ..Default::default()
            }),
        )])
        .unwrap();
        config.routes = crate::config::Snapshot::from_entries([
            ("orphan", crate::config::RouteConfig::to_cluster("api")),
            ("nowhere", crate::config::RouteConfig::default()),
        ])
        .unwrap();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.contains(&ValidationError::MissingAddress {
            cluster: "web".into(),
            destination: "empty".into(),
        }));
        assert!(errors.contains(&ValidationError::UnknownCluster {
            route: "orphan".into(),
            cluster: "api".into(),
        }));
        assert!(errors.contains(&ValidationError::MissingCluster {
            route: "nowhere".into(),
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { field: "address", .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidHealthCheck { .. })));
    }

    #[test]
    fn test_disabled_health_check_is_not_checked() {
        let check = HealthCheckConfig {
            enabled: false,
            interval_secs: 0,
            ..Default::default()
        };
        assert!(check_health_check(&check).is_empty());
    }
}

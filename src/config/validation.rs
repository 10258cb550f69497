//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every route can be compiled into a route definition
//! - Validate value ranges (timeouts > 0, request deadline above RPC deadline,
//!   addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, DEFAULT_ADMIN_KEY};
use crate::routing::route::RouteDefinition;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routes[{index}].url `{url}`: {reason}")]
    RouteUrl {
        index: usize,
        url: String,
        reason: &'static str,
    },

    #[error("routes[{index}].method `{method}` is not a valid HTTP method")]
    RouteMethod { index: usize, method: String },

    #[error("routes[{index}].service `{service}` must have the form package.service.method")]
    RouteService { index: usize, service: String },

    #[error("routes[{index}].rpc: {reason}")]
    RouteEndpoint { index: usize, reason: &'static str },

    #[error("{field} `{value}` is not a valid socket address")]
    Address { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("timeouts.request_secs ({request_secs}) must be greater than timeouts.rpc_secs ({rpc_secs})")]
    TimeoutOrder { request_secs: u64, rpc_secs: u64 },

    #[error("admin.api_key must be changed when the admin API is enabled")]
    DefaultAdminKey,
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, route) in config.routes.iter().enumerate() {
        if let Err(mut route_errors) = RouteDefinition::from_config(index, route) {
            errors.append(&mut route_errors);
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key == DEFAULT_ADMIN_KEY || config.admin.api_key.is_empty() {
            errors.push(ValidationError::DefaultAdminKey);
        }
    }

    for (field, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.rpc_secs", config.timeouts.rpc_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }

    // The RPC deadline has to fire before the request deadline.
    let timeouts = &config.timeouts;
    if timeouts.rpc_secs > 0 && timeouts.request_secs <= timeouts.rpc_secs {
        errors.push(ValidationError::TimeoutOrder {
            request_secs: timeouts.request_secs,
            rpc_secs: timeouts.rpc_secs,
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, RpcEndpointConfig};

    fn route(url: &str, method: &str, service: &str, port: u16) -> RouteConfig {
        RouteConfig {
            url: url.into(),
            method: method.into(),
            service: service.into(),
            rpc: RpcEndpointConfig {
                ip: "localhost".into(),
                port,
            },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.routes.push(route("hello", "GET", "helloworld.Greeter", 0));
        config.timeouts.rpc_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::RouteUrl { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::RouteService { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::RouteEndpoint { .. })));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.rpc_secs")));
    }

    #[test]
    fn test_admin_requires_real_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DefaultAdminKey]);

        config.admin.api_key = "s3cret".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_request_deadline_must_exceed_rpc_deadline() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 1;
        config.timeouts.rpc_secs = 3;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TimeoutOrder {
                request_secs: 1,
                rpc_secs: 3
            }]
        );

        config.timeouts.request_secs = 3;
        assert_eq!(validate_config(&config).unwrap_err().len(), 1);

        config.timeouts.request_secs = 4;
        assert!(validate_config(&config).is_ok());
    }
}

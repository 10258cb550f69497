//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ordered route table. First match wins.
    pub routes: Vec<RouteConfig>,

    /// Where and how interface schemas are loaded.
    pub schema: SchemaConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// A single route binding an HTTP method + path to a remote method.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Path to match exactly (no query string).
    pub url: String,

    /// HTTP verb, matched case-insensitively.
    pub method: String,

    /// Dotted `package.Service.Method` identifier.
    pub service: String,

    /// Downstream endpoint.
    pub rpc: RpcEndpointConfig,
}

/// Downstream RPC endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RpcEndpointConfig {
    /// Host name or IP address.
    pub ip: String,

    /// TCP port.
    pub port: u16,
}

/// Interface schema loading.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory holding one `<package>.bin` descriptor set per package.
    pub dir: String,

    /// Cache loaded schemas by package name.
    /// When disabled the descriptor set is read again on every request.
    pub cache: bool,

    /// Resolve every route's method at startup and fail fast on errors.
    pub preload: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dir: "proto".to_string(),
            cache: true,
            preload: false,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request in seconds.
    pub request_secs: u64,

    /// Deadline for a single downstream RPC in seconds.
    pub rpc_secs: u64,

    /// Connection establishment timeout for downstream channels in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            rpc_secs: 10,
            connect_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Placeholder admin key rejected by validation when the admin API is on.
pub const DEFAULT_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: DEFAULT_ADMIN_KEY.to_string(),
            bind_address: "127.0.0.1:3001".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_table() {
        let raw = r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [[routes]]
            url = "/hello"
            method = "GET"
            service = "helloworld.Greeter.SayHello"
            rpc = { ip = "localhost", port = 50051 }

            [[routes]]
            url = "/test"
            method = "post"
            service = "helloworld.Greeter.Test"
            rpc = { ip = "10.0.0.2", port = 50052 }
        "#;

        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].url, "/hello");
        assert_eq!(config.routes[1].rpc.port, 50052);
        // untouched sections fall back to defaults
        assert!(config.schema.cache);
        assert_eq!(config.timeouts.rpc_secs, 10);
    }

    #[test]
    fn test_missing_rpc_is_parse_error() {
        let raw = r#"
            [[routes]]
            url = "/hello"
            method = "GET"
            service = "helloworld.Greeter.SayHello"
        "#;
        assert!(toml::from_str::<GatewayConfig>(raw).is_err());
    }
}

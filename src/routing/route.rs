//! Compiled route definitions.
//!
//! A [`RouteDefinition`] is built once from a [`RouteConfig`] and never
//! mutated. Building is where a malformed route is rejected.

use std::fmt;
use axum::http::Method;

use crate::config::schema::RouteConfig;
use crate::config::validation::ValidationError;
use crate::http::request::InboundRequest;
use crate::routing::matcher::{AndMatcher, ExactPathMatcher, Matcher, MethodMatcher};

/// A dotted `package.Service.Method` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentifier {
    pub package: String,
    pub service: String,
    pub method: String,
}

impl ServiceIdentifier {
    /// Split an identifier into exactly three non-empty components.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let (package, service, method) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || [package, service, method].iter().any(|p| p.trim().is_empty()) {
            return None;
        }
        Some(Self {
            package: package.to_string(),
            service: service.to_string(),
            method: method.to_string(),
        })
    }

    /// Fully-qualified service name, e.g. `helloworld.Greeter`.
    pub fn qualified_service(&self) -> String {
        format!("{}.{}", self.package, self.service)
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.package, self.service, self.method)
    }
}

/// Network address of a downstream service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// URI used to open a channel to this endpoint.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A declared binding from an HTTP method + path to a remote method.
#[derive(Debug)]
pub struct RouteDefinition {
    pub path: String,
    pub http_method: Method,
    pub service: ServiceIdentifier,
    pub endpoint: Endpoint,
    matcher: AndMatcher,
}

impl RouteDefinition {
    /// Compile the route at position `index` of the table.
    /// Every problem with the entry is reported, not just the first.
    pub fn from_config(index: usize, config: &RouteConfig) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let url_problem = if config.url.is_empty() {
            Some("must not be empty")
        } else if !config.url.starts_with('/') {
            Some("must start with '/'")
        } else if config.url.contains('?') {
            Some("must not contain a query string")
        } else {
            None
        };
        if let Some(reason) = url_problem {
            errors.push(ValidationError::RouteUrl {
                index,
                url: config.url.clone(),
                reason,
            });
        }

        let http_method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes()).ok();
        if http_method.is_none() || config.method.is_empty() {
            errors.push(ValidationError::RouteMethod {
                index,
                method: config.method.clone(),
            });
        }

        let service = ServiceIdentifier::parse(&config.service);
        if service.is_none() {
            errors.push(ValidationError::RouteService {
                index,
                service: config.service.clone(),
            });
        }

        if config.rpc.ip.trim().is_empty() {
            errors.push(ValidationError::RouteEndpoint { index, reason: "ip must not be empty" });
        }
        if config.rpc.port == 0 {
            errors.push(ValidationError::RouteEndpoint { index, reason: "port must not be zero" });
        }

        match (http_method, service) {
            (Some(http_method), Some(service)) if errors.is_empty() => {
                let matcher = AndMatcher::new(vec![
                    Box::new(MethodMatcher::new(http_method.as_str())),
                    Box::new(ExactPathMatcher::new(config.url.clone())),
                ]);
                Ok(Self {
                    path: config.url.clone(),
                    http_method,
                    service,
                    endpoint: Endpoint {
                        host: config.rpc.ip.trim().to_string(),
                        port: config.rpc.port,
                    },
                    matcher,
                })
            }
            _ => Err(errors),
        }
    }

    /// Returns true if the request's method and path select this route.
    pub fn matches(&self, req: &InboundRequest) -> bool {
        self.matcher.matches(req)
    }
}

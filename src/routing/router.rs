//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Look up the first route matching a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in table order; ties resolved by position, never an error
//! - Reload replaces the whole table, see `gateway::dispatcher`

use std::collections::HashSet;

use crate::config::loader::ConfigError;
use crate::config::schema::RouteConfig;
use crate::http::request::InboundRequest;
use crate::routing::route::{Endpoint, RouteDefinition};

/// Ordered, immutable sequence of route definitions.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Compile every configured route, preserving order.
    pub fn load(configs: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut routes = Vec::with_capacity(configs.len());
        let mut errors = Vec::new();

        for (index, config) in configs.iter().enumerate() {
            match RouteDefinition::from_config(index, config) {
                Ok(route) => routes.push(route),
                Err(mut route_errors) => errors.append(&mut route_errors),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        if routes.is_empty() {
            tracing::warn!("Route table is empty; every request will be answered with code 1");
        }

        Ok(Self { routes })
    }

    /// First route whose method and path match the request.
    pub fn match_request(&self, req: &InboundRequest) -> Option<&RouteDefinition> {
        self.routes.iter().find(|route| route.matches(req))
    }

    /// Routes in table order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Distinct downstream endpoints referenced by the table.
    pub fn endpoints(&self) -> HashSet<Endpoint> {
        self.routes.iter().map(|r| r.endpoint.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

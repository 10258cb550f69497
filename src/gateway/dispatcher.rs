//! Request dispatch.
//!
//! # Responsibilities
//! - Match the request against the current route table
//! - Resolve the route's method descriptor and client
//! - Merge query and body parameters into the request message
//! - Invoke the remote method under a deadline
//!
//! # Design Decisions
//! - Every per-request failure becomes an [`Outcome`]; nothing escapes
//! - No retries; a remote failure is reported immediately
//! - The route table is swapped whole on reload (arc-swap), so an
//!   in-flight request keeps the table it started with

use arc_swap::ArcSwap;
use prost_reflect::{DeserializeOptions, DynamicMessage, Kind, MessageDescriptor, MethodDescriptor, SerializeOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tonic::metadata::KeyAndValueRef;
use tonic::Status;

use crate::config::{ConfigError, GatewayConfig, RouteConfig};
use crate::http::request::InboundRequest;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::rpc::{ClientError, ClientRegistry, GrpcConnector};
use crate::schema::{SchemaError, SchemaResolver};

/// Result of dispatching one request.
#[derive(Debug)]
pub enum Outcome {
    /// No route matched the method and path.
    NoRoute,
    /// The route's schema, method or client could not be resolved.
    ResolutionFailed(ResolveError),
    /// The merged parameters do not fit the request message.
    InvalidPayload(PayloadError),
    /// The remote call returned a message, rendered as JSON.
    Success(Value),
    /// The remote call failed or timed out.
    RemoteFailure(RemoteError),
}

/// Failure to turn a matched route into a callable.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Merged parameters that cannot be represented as the request message.
#[derive(Debug, Error)]
#[error("request does not fit {message}: {reason}")]
pub struct PayloadError {
    pub message: String,
    pub reason: String,
}

/// Serializable detail of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// gRPC status code.
    pub code: i32,
    pub details: String,
    pub metadata: BTreeMap<String, String>,
}

impl From<&Status> for RemoteError {
    fn from(status: &Status) -> Self {
        let metadata = status
            .metadata()
            .iter()
            .map(|entry| match entry {
                KeyAndValueRef::Ascii(k, v) => (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_encoded_bytes()).into_owned(),
                ),
                KeyAndValueRef::Binary(k, v) => (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_encoded_bytes()).into_owned(),
                ),
            })
            .collect();

        Self {
            code: status.code() as i32,
            details: status.message().to_string(),
            metadata,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote call failed with code {}: {}", self.code, self.details)
    }
}

/// Orchestrates matching, resolution and invocation.
#[derive(Debug)]
pub struct Dispatcher {
    routes: ArcSwap<RouteTable>,
    schemas: SchemaResolver,
    clients: ClientRegistry,
    rpc_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        routes: RouteTable,
        schemas: SchemaResolver,
        clients: ClientRegistry,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            schemas,
            clients,
            rpc_timeout,
        }
    }

    /// Build a dispatcher calling real gRPC endpoints.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let routes = RouteTable::load(&config.routes)?;
        let connector = GrpcConnector::new(Duration::from_secs(config.timeouts.connect_secs));
        Ok(Self::new(
            routes,
            SchemaResolver::new(&config.schema),
            ClientRegistry::new(Arc::new(connector)),
            Duration::from_secs(config.timeouts.rpc_secs),
        ))
    }

    /// Resolve every route's method now. Returns the number of routes checked.
    pub fn preload(&self) -> Result<usize, ResolveError> {
        let routes = self.routes.load_full();
        for route in routes.routes() {
            let id = &route.service;
            self.schemas.resolve_method(&id.package, &id.service, &id.method)?;
        }
        tracing::info!(routes = routes.len(), "Preloaded interface schemas");
        Ok(routes.len())
    }

    /// Replace the route table. Cached schemas are dropped and clients for
    /// endpoints no longer routed to are evicted.
    pub fn reload(&self, configs: &[RouteConfig]) -> Result<(), ConfigError> {
        let table = RouteTable::load(configs)?;
        let endpoints = table.endpoints();
        let count = table.len();

        self.routes.store(Arc::new(table));
        self.schemas.invalidate_all();
        self.clients.evict_unused(&endpoints);

        tracing::info!(routes = count, "Route table replaced");
        Ok(())
    }

    /// Snapshot of the current route table.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    pub fn schemas(&self) -> &SchemaResolver {
        &self.schemas
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Dispatch one request to its downstream method.
    pub async fn dispatch(&self, request: &InboundRequest) -> Outcome {
        let routes = self.routes.load_full();
        let Some(route) = routes.match_request(request) else {
            tracing::debug!(method = %request.method, path = %request.path, "No route matched");
            return Outcome::NoRoute;
        };
        let id = &route.service;

        let method = match self
            .schemas
            .resolve(&id.package)
            .and_then(|schema| schema.resolve_method(&id.service, &id.method))
        {
            Ok(method) => method,
            Err(e) => {
                tracing::warn!(service = %id, error = %e, "Failed to resolve method");
                return Outcome::ResolutionFailed(e.into());
            }
        };

        let client = match self.clients.get_client(&route.endpoint, &id.qualified_service()) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(service = %id, endpoint = %route.endpoint, error = %e, "Failed to obtain client");
                return Outcome::ResolutionFailed(e.into());
            }
        };

        let payload = merge_params(&request.query, &request.body);
        let message = match encode_payload(&method, payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(service = %id, error = %e, "Rejected request parameters");
                return Outcome::InvalidPayload(e);
            }
        };

        let label = id.to_string();
        let start = Instant::now();
        let result = tokio::time::timeout(self.rpc_timeout, client.unary(&method, message)).await;

        let outcome = match result {
            Ok(Ok(response)) => match decode_response(&response) {
                Ok(value) => Outcome::Success(value),
                Err(status) => Outcome::RemoteFailure(RemoteError::from(&status)),
            },
            Ok(Err(status)) => Outcome::RemoteFailure(RemoteError::from(&status)),
            Err(_) => {
                let status = Status::deadline_exceeded(format!(
                    "no response from {} within {}ms",
                    route.endpoint,
                    self.rpc_timeout.as_millis()
                ));
                Outcome::RemoteFailure(RemoteError::from(&status))
            }
        };

        let ok = matches!(outcome, Outcome::Success(_));
        metrics::record_rpc(&label, ok, start);
        if let Outcome::RemoteFailure(e) = &outcome {
            tracing::warn!(service = %label, endpoint = %route.endpoint, code = e.code, details = %e.details, "Remote call failed");
        } else {
            tracing::debug!(service = %label, latency_ms = start.elapsed().as_millis() as u64, "Remote call succeeded");
        }
        outcome
    }
}

/// Query parameters overlaid with body fields; body wins on collision.
pub fn merge_params(query: &Map<String, Value>, body: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = query.clone();
    for (key, value) in body {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Build the request message. Keys the message does not declare are dropped.
///
/// Query and form values always arrive as strings, so string values of
/// singular bool fields are coerced first. Numeric strings need no help.
pub fn encode_payload(method: &MethodDescriptor, mut payload: Map<String, Value>) -> Result<DynamicMessage, PayloadError> {
    let input = method.input();
    coerce_strings(&input, &mut payload);

    let options = DeserializeOptions::new().deny_unknown_fields(false);
    DynamicMessage::deserialize_with_options(input.clone(), Value::Object(payload), &options).map_err(|e| PayloadError {
        message: input.full_name().to_string(),
        reason: e.to_string(),
    })
}

fn coerce_strings(input: &MessageDescriptor, payload: &mut Map<String, Value>) {
    for (key, value) in payload.iter_mut() {
        let Some(field) = input
            .get_field_by_name(key)
            .or_else(|| input.get_field_by_json_name(key))
        else {
            continue;
        };
        if field.is_list() || field.is_map() || !matches!(field.kind(), Kind::Bool) {
            continue;
        }
        if let Value::String(raw) = value {
            match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => *value = Value::Bool(true),
                "false" | "0" => *value = Value::Bool(false),
                _ => {}
            }
        }
    }
}

/// Render a response message as JSON with proto field names and defaults.
pub fn decode_response(message: &DynamicMessage) -> Result<Value, Status> {
    let options = SerializeOptions::new()
        .skip_default_fields(false)
        .use_proto_field_name(true);
    message
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(|e| Status::internal(format!("failed to render response: {e}")))
}

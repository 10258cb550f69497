//! Declarative HTTP → gRPC gateway library.
//!
//! Inbound HTTP requests are matched against an ordered route table and
//! translated into unary gRPC calls whose service and method come from a
//! dotted `package.Service.Method` identifier. Message shapes are read at
//! runtime from descriptor sets, so no generated code is involved.

pub mod admin;
pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod rpc;
pub mod schema;

pub use config::schema::GatewayConfig;
pub use gateway::{Dispatcher, Outcome};
pub use http::{GatewayServer, ResponseEnvelope};
pub use lifecycle::Shutdown;

//! Downstream RPC subsystem.
//!
//! # Data Flow
//! ```text
//! (endpoint, service)
//!     → registry.rs (lookup or lazily create)
//!     → client.rs (RpcClient over a tonic Channel)
//!     → codec.rs (DynamicMessage ⇄ protobuf bytes)
//!     → downstream gRPC server
//! ```

pub mod client;
pub mod codec;
pub mod registry;

use thiserror::Error;

pub use client::{Connector, GrpcClient, GrpcConnector, RpcClient};
pub use registry::{ClientKey, ClientRegistry};

/// Failure to construct a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

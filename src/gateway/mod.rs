//! Dispatch core.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → routing (first matching RouteDefinition, or NoRoute)
//!     → schema (package → InterfaceSchema → MethodDescriptor)
//!     → rpc registry (endpoint + service → RpcClient)
//!     → merge query + body, encode, invoke under deadline
//!     → Outcome (handed to http::response for normalization)
//! ```

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Outcome, PayloadError, RemoteError, ResolveError};

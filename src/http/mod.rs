//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, normalize method/path/query/body)
//!     → gateway::Dispatcher (route, resolve, invoke)
//!     → response.rs (normalize outcome into envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, RequestError, X_REQUEST_ID};
pub use response::{normalize, ResponseEnvelope};
pub use server::{AppState, GatewayServer};

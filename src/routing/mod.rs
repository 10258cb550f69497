//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (ordered scan)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched RouteDefinition or none
//!
//! Route compilation (at startup and on reload):
//!     RouteConfig[]
//!     → route.rs (validate, split service identifier, compile matchers)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - Exact path equality only
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod matcher;
pub mod route;
pub mod router;

pub use route::{Endpoint, RouteDefinition, ServiceIdentifier};
pub use router::RouteTable;

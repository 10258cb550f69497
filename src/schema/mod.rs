//! Interface schema subsystem.
//!
//! # Data Flow
//! ```text
//! package name (from service identifier)
//!     → resolver.rs (cache lookup or load `<dir>/<package>.bin`)
//!     → InterfaceSchema (decoded descriptor pool)
//!     → resolve_method(service, method)
//!     → MethodDescriptor (input/output message shapes, RPC path)
//! ```

pub mod resolver;

#[cfg(test)]
pub(crate) mod fixtures;

use std::path::PathBuf;
use thiserror::Error;

pub use resolver::{InterfaceSchema, SchemaResolver};

/// Failure to obtain a schema or a method from it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no schema for package `{package}` at {}", path.display())]
    NotFound { package: String, path: PathBuf },

    #[error("failed to read schema for package `{package}`: {source}")]
    Io {
        package: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema for package `{package}`: {reason}")]
    Malformed { package: String, reason: String },

    #[error("service `{service}` not found in package `{package}`")]
    ServiceNotFound { package: String, service: String },

    #[error("method `{method}` not found on service `{service}`")]
    MethodNotFound { service: String, method: String },
}

impl SchemaError {
    /// True for errors about the schema itself rather than a missing
    /// service or method inside a valid one.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            SchemaError::NotFound { .. } | SchemaError::Io { .. } | SchemaError::Malformed { .. }
        )
    }
}

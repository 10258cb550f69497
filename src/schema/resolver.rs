//! Interface schema resolution.
//!
//! # Responsibilities
//! - Load the descriptor set for a package from the schema directory
//! - Cache loaded schemas by package name (optional)
//! - Resolve `service` + `method` names to a callable method descriptor
//! - Offer explicit invalidation hooks
//!
//! # Design Decisions
//! - One `<package>.bin` FileDescriptorSet per package
//! - File I/O happens outside the cache lock; the first inserted entry wins,
//!   so concurrent first access never produces a torn entry
//! - A method also resolves when only the case of its first letter differs

use dashmap::DashMap;
use prost_reflect::{DescriptorPool, MethodDescriptor, ServiceDescriptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SchemaConfig;
use crate::observability::metrics;
use crate::schema::SchemaError;

/// Loaded interface description for one package.
#[derive(Debug, Clone)]
pub struct InterfaceSchema {
    package: String,
    pool: DescriptorPool,
}

impl InterfaceSchema {
    /// Wrap an already decoded pool.
    pub fn new(package: impl Into<String>, pool: DescriptorPool) -> Self {
        Self {
            package: package.into(),
            pool,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Look up a service of this package by its short name.
    pub fn service(&self, service: &str) -> Result<ServiceDescriptor, SchemaError> {
        self.pool
            .get_service_by_name(&format!("{}.{}", self.package, service))
            .ok_or_else(|| SchemaError::ServiceNotFound {
                package: self.package.clone(),
                service: service.to_string(),
            })
    }

    /// Resolve `service.method` to a method descriptor.
    pub fn resolve_method(&self, service: &str, method: &str) -> Result<MethodDescriptor, SchemaError> {
        let descriptor = self.service(service)?;
        let found = descriptor
            .methods()
            .find(|m| m.name() == method)
            .or_else(|| descriptor.methods().find(|m| same_but_first_letter_case(m.name(), method)));

        found.ok_or_else(|| SchemaError::MethodNotFound {
            service: descriptor.full_name().to_string(),
            method: method.to_string(),
        })
    }
}

fn same_but_first_letter_case(a: &str, b: &str) -> bool {
    let (mut a_chars, mut b_chars) = (a.chars(), b.chars());
    match (a_chars.next(), b_chars.next()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(&y) && a_chars.as_str() == b_chars.as_str(),
        _ => false,
    }
}

/// Obtains interface schemas by package name.
#[derive(Debug)]
pub struct SchemaResolver {
    dir: PathBuf,
    cache_enabled: bool,
    cache: DashMap<String, Arc<InterfaceSchema>>,
}

impl SchemaResolver {
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            cache_enabled: config.cache,
            cache: DashMap::new(),
        }
    }

    /// Path of the descriptor set for `package`.
    pub fn descriptor_path(&self, package: &str) -> PathBuf {
        self.dir.join(format!("{package}.bin"))
    }

    /// Return the schema for `package`, loading it if needed.
    pub fn resolve(&self, package: &str) -> Result<Arc<InterfaceSchema>, SchemaError> {
        if self.cache_enabled {
            if let Some(hit) = self.cache.get(package) {
                return Ok(hit.value().clone());
            }
        }

        let loaded = Arc::new(self.load(package)?);

        if !self.cache_enabled {
            return Ok(loaded);
        }
        let entry = self.cache.entry(package.to_string()).or_insert(loaded);
        Ok(entry.value().clone())
    }

    /// Convenience: resolve package then method.
    pub fn resolve_method(
        &self,
        package: &str,
        service: &str,
        method: &str,
    ) -> Result<MethodDescriptor, SchemaError> {
        self.resolve(package)?.resolve_method(service, method)
    }

    /// Drop the cached schema of one package. Returns true if one was cached.
    pub fn invalidate(&self, package: &str) -> bool {
        let removed = self.cache.remove(package).is_some();
        if removed {
            tracing::info!(package = %package, "Invalidated cached schema");
        }
        removed
    }

    /// Drop every cached schema. Returns how many were dropped.
    pub fn invalidate_all(&self) -> usize {
        let count = self.cache.len();
        self.cache.clear();
        tracing::info!(count, "Invalidated all cached schemas");
        count
    }

    /// Package names currently cached.
    pub fn cached_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = self.cache.iter().map(|e| e.key().clone()).collect();
        packages.sort();
        packages
    }

    fn load(&self, package: &str) -> Result<InterfaceSchema, SchemaError> {
        let path = self.descriptor_path(package);
        let result = read_descriptor_set(package, &path);
        metrics::record_schema_load(package, result.is_ok());

        match &result {
            Ok(_) => tracing::debug!(package = %package, path = ?path, "Loaded interface schema"),
            Err(e) => tracing::warn!(package = %package, error = %e, "Failed to load interface schema"),
        }
        result
    }
}

fn read_descriptor_set(package: &str, path: &Path) -> Result<InterfaceSchema, SchemaError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SchemaError::NotFound {
                package: package.to_string(),
                path: path.to_path_buf(),
            }
        } else {
            SchemaError::Io {
                package: package.to_string(),
                source,
            }
        }
    })?;

    let pool = DescriptorPool::decode(bytes.as_slice()).map_err(|e| SchemaError::Malformed {
        package: package.to_string(),
        reason: e.to_string(),
    })?;

    let prefix = format!("{package}.");
    if !pool.services().any(|s| s.full_name().starts_with(&prefix)) {
        return Err(SchemaError::Malformed {
            package: package.to_string(),
            reason: "descriptor set declares no service in this package".to_string(),
        });
    }

    Ok(InterfaceSchema::new(package, pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures;

    fn resolver(dir: &Path, cache: bool) -> SchemaResolver {
        SchemaResolver::new(&SchemaConfig {
            dir: dir.to_string_lossy().into_owned(),
            cache,
            preload: false,
        })
    }

    #[test]
    fn test_resolve_method() {
        let dir = fixtures::schema_dir();
        let resolver = resolver(&dir, true);

        let method = resolver.resolve_method("helloworld", "Greeter", "SayHello").unwrap();
        assert_eq!(method.full_name(), "helloworld.Greeter.SayHello");
        assert_eq!(method.input().full_name(), "helloworld.HelloRequest");

        // lower camel case alias
        let method = resolver.resolve_method("helloworld", "Greeter", "sayHello").unwrap();
        assert_eq!(method.name(), "SayHello");
    }

    #[test]
    fn test_unknown_service_and_method() {
        let dir = fixtures::schema_dir();
        let resolver = resolver(&dir, true);

        let err = resolver.resolve_method("helloworld", "Nope", "SayHello").unwrap_err();
        assert!(matches!(err, SchemaError::ServiceNotFound { .. }));

        let err = resolver.resolve_method("helloworld", "Greeter", "Nope").unwrap_err();
        assert!(matches!(err, SchemaError::MethodNotFound { .. }));
    }

    #[test]
    fn test_missing_and_malformed_packages() {
        let dir = fixtures::schema_dir();
        std::fs::write(dir.join("broken.bin"), b"\xff\xff\xff not a descriptor").unwrap();
        let resolver = resolver(&dir, true);

        assert!(matches!(resolver.resolve("absent").unwrap_err(), SchemaError::NotFound { .. }));
        assert!(matches!(resolver.resolve("broken").unwrap_err(), SchemaError::Malformed { .. }));
        assert!(resolver.cached_packages().is_empty());
    }

    #[test]
    fn test_cache_and_invalidate() {
        let dir = fixtures::schema_dir();
        let resolver = resolver(&dir, true);

        let first = resolver.resolve("helloworld").unwrap();
        let second = resolver.resolve("helloworld").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached_packages(), vec!["helloworld".to_string()]);

        // Cached copy survives the file disappearing until invalidated.
        std::fs::remove_file(resolver.descriptor_path("helloworld")).unwrap();
        assert!(resolver.resolve("helloworld").is_ok());
        assert!(resolver.invalidate("helloworld"));
        assert!(resolver.resolve("helloworld").is_err());
    }

    #[test]
    fn test_uncached_reads_every_time() {
        let dir = fixtures::schema_dir();
        let resolver = resolver(&dir, false);

        let first = resolver.resolve("helloworld").unwrap();
        let second = resolver.resolve("helloworld").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(resolver.cached_packages().is_empty());
        assert_eq!(resolver.invalidate_all(), 0);
    }
}

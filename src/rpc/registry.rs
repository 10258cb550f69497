//! Client registry.
//!
//! # Responsibilities
//! - Hand out one shared client per `(host, port, service)`
//! - Create clients lazily on first use
//! - Evict clients whose endpoint left the route table
//!
//! # Design Decisions
//! - Creation runs under the entry lock of its shard only, and connectors
//!   do no I/O, so lookups for other keys are not held up
//! - At most one client is ever created per key
//! - Never closed per request

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::observability::metrics;
use crate::routing::Endpoint;
use crate::rpc::client::{Connector, RpcClient};
use crate::rpc::ClientError;

/// Registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub endpoint: Endpoint,
    /// Fully-qualified service name.
    pub service: String,
}

/// Shared clients keyed by endpoint and service.
#[derive(Debug)]
pub struct ClientRegistry {
    connector: Arc<dyn Connector>,
    clients: DashMap<ClientKey, Arc<dyn RpcClient>>,
}

impl ClientRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            clients: DashMap::new(),
        }
    }

    /// Existing client for the pair, or a newly created and stored one.
    pub fn get_client(&self, endpoint: &Endpoint, service: &str) -> Result<Arc<dyn RpcClient>, ClientError> {
        let key = ClientKey {
            endpoint: endpoint.clone(),
            service: service.to_string(),
        };

        if let Some(existing) = self.clients.get(&key) {
            return Ok(existing.value().clone());
        }

        let entry = self.clients.entry(key).or_try_insert_with(|| {
            tracing::info!(endpoint = %endpoint, service = %service, "Creating RPC client");
            self.connector.connect(endpoint, service)
        })?;
        let client = entry.value().clone();
        drop(entry);

        metrics::record_client_count(self.clients.len());
        Ok(client)
    }

    /// Drop clients whose endpoint is not in `keep`. Returns how many went.
    pub fn evict_unused(&self, keep: &HashSet<Endpoint>) -> usize {
        let before = self.clients.len();
        self.clients.retain(|key, _| keep.contains(&key.endpoint));
        let evicted = before.saturating_sub(self.clients.len());
        if evicted > 0 {
            tracing::info!(evicted, "Evicted RPC clients for removed endpoints");
        }
        metrics::record_client_count(self.clients.len());
        evicted
    }

    /// Drop every client. Returns how many went.
    pub fn clear(&self) -> usize {
        let count = self.clients.len();
        self.clients.clear();
        metrics::record_client_count(0);
        count
    }

    /// Keys of all live clients, sorted for stable output.
    pub fn keys(&self) -> Vec<ClientKey> {
        let mut keys: Vec<ClientKey> = self.clients.iter().map(|e| e.key().clone()).collect();
        keys.sort_by(|a, b| {
            (&a.endpoint.host, a.endpoint.port, &a.service).cmp(&(&b.endpoint.host, b.endpoint.port, &b.service))
        });
        keys
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

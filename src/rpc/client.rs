//! Downstream RPC clients.
//!
//! # Responsibilities
//! - Abstract a unary call against one `(endpoint, service)` pair
//! - Build gRPC clients over lazily-connecting tonic channels
//!
//! # Design Decisions
//! - `RpcClient` is object safe so the registry can hold any implementation
//! - A tonic `Channel` multiplexes concurrent calls; each call clones the
//!   cheap client handle instead of locking it
//! - Construction never touches the network; the first call connects

use futures_util::future::BoxFuture;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use axum::http::uri::PathAndQuery;
use tonic::client::Grpc;
use tonic::transport::{Channel, Endpoint as ChannelEndpoint};
use tonic::Status;

use crate::routing::Endpoint;
use crate::rpc::codec::DynamicCodec;
use crate::rpc::ClientError;

/// A live callable bound to one downstream service instance.
pub trait RpcClient: Send + Sync + fmt::Debug {
    /// Invoke a unary method with an already encoded-ready request.
    fn unary(
        &self,
        method: &MethodDescriptor,
        request: DynamicMessage,
    ) -> BoxFuture<'static, Result<DynamicMessage, Status>>;
}

/// Creates clients for the registry.
pub trait Connector: Send + Sync + fmt::Debug {
    fn connect(&self, endpoint: &Endpoint, service: &str) -> Result<Arc<dyn RpcClient>, ClientError>;
}

/// gRPC client for one service over one channel.
#[derive(Clone)]
pub struct GrpcClient {
    service: String,
    grpc: Grpc<Channel>,
}

impl GrpcClient {
    pub fn new(service: impl Into<String>, channel: Channel) -> Self {
        Self {
            service: service.into(),
            grpc: Grpc::new(channel),
        }
    }
}

impl fmt::Debug for GrpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcClient").field("service", &self.service).finish()
    }
}

impl RpcClient for GrpcClient {
    fn unary(
        &self,
        method: &MethodDescriptor,
        request: DynamicMessage,
    ) -> BoxFuture<'static, Result<DynamicMessage, Status>> {
        let mut grpc = self.grpc.clone();
        let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
        let codec = DynamicCodec::new(method.output());

        Box::pin(async move {
            let path = PathAndQuery::try_from(path)
                .map_err(|e| Status::internal(format!("invalid method path: {e}")))?;
            grpc.ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;
            let response = grpc.unary(tonic::Request::new(request), path, codec).await?;
            Ok(response.into_inner())
        })
    }
}

/// Builds [`GrpcClient`]s with lazily-connecting channels.
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    connect_timeout: Duration,
}

impl GrpcConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for GrpcConnector {
    fn connect(&self, endpoint: &Endpoint, service: &str) -> Result<Arc<dyn RpcClient>, ClientError> {
        let channel = ChannelEndpoint::from_shared(endpoint.uri())
            .map_err(|e| ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?
            .connect_timeout(self.connect_timeout)
            .connect_lazy();

        tracing::debug!(endpoint = %endpoint, service = %service, "Created gRPC channel");
        Ok(Arc::new(GrpcClient::new(service, channel)))
    }
}

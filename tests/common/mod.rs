//! Shared utilities for integration tests.
//!
//! Provides the `helloworld` descriptor set used as a schema, and a
//! dynamic gRPC `helloworld.Greeter` backend built on the same descriptors.

#![allow(dead_code)]

use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MethodDescriptor};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::task::{Context, Poll};
use std::time::Duration;
use tonic::codegen::{empty_body, http, Body, BoxFuture, Service, StdError};
use tonic::server::{NamedService, UnaryService};
use tonic::Status;

use rpc_gateway::config::{GatewayConfig, RouteConfig, RpcEndpointConfig};
use rpc_gateway::rpc::codec::DynamicCodec;

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.into()),
        ..Default::default()
    }
}

fn bool_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        r#type: Some(Type::Bool as i32),
        ..string_field(name, number)
    }
}

fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.into()),
        input_type: Some(format!(".helloworld.{input}")),
        output_type: Some(format!(".helloworld.{output}")),
        ..Default::default()
    }
}

/// `helloworld.Greeter` with `SayHello` (echo), `Fail` and `Nothing`.
pub fn descriptor_set() -> FileDescriptorSet {
    let message = |name: &str, field: Vec<FieldDescriptorProto>| DescriptorProto {
        name: Some(name.into()),
        field,
        ..Default::default()
    };
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("helloworld.proto".into()),
            package: Some("helloworld".into()),
            message_type: vec![
                message(
                    "HelloRequest",
                    vec![
                        string_field("query", 1),
                        string_field("test", 2),
                        string_field("name", 3),
                        bool_field("excited", 4),
                    ],
                ),
                message("HelloReply", vec![string_field("query", 1)]),
                message("Empty", vec![]),
            ],
            service: vec![ServiceDescriptorProto {
                name: Some("Greeter".into()),
                method: vec![
                    method("SayHello", "HelloRequest", "HelloReply"),
                    method("Fail", "HelloRequest", "HelloReply"),
                    method("Nothing", "HelloRequest", "Empty"),
                ],
                ..Default::default()
            }],
            syntax: Some("proto3".into()),
            ..Default::default()
        }],
    }
}

/// Fresh directory containing `helloworld.bin`.
pub fn schema_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rpc-gateway-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("helloworld.bin"), descriptor_set().encode_to_vec()).unwrap();
    dir
}

pub fn route(method: &str, url: &str, service: &str, port: u16) -> RouteConfig {
    RouteConfig {
        url: url.into(),
        method: method.into(),
        service: service.into(),
        rpc: RpcEndpointConfig {
            ip: "127.0.0.1".into(),
            port,
        },
    }
}

/// Gateway config over `routes` with the helloworld schema directory.
pub fn gateway_config(routes: Vec<RouteConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes = routes;
    config.schema.dir = schema_dir().to_string_lossy().into_owned();
    config.timeouts.rpc_secs = 2;
    config.timeouts.connect_secs = 1;
    config.observability.metrics_enabled = false;
    config
}

/// Dynamic `helloworld.Greeter` backend.
///
/// `SayHello` echoes `query`, `Fail` answers INTERNAL "boom" and
/// `Nothing` returns an empty message.
#[derive(Clone)]
pub struct EchoGreeter {
    pool: DescriptorPool,
}

impl EchoGreeter {
    pub fn new() -> Self {
        let pool = DescriptorPool::decode(descriptor_set().encode_to_vec().as_slice()).unwrap();
        Self { pool }
    }

    fn method(&self, path: &str) -> Option<MethodDescriptor> {
        let (service, method) = path.trim_start_matches('/').split_once('/')?;
        self.pool
            .get_service_by_name(service)?
            .methods()
            .find(|m| m.name() == method)
    }
}

impl NamedService for EchoGreeter {
    const NAME: &'static str = "helloworld.Greeter";
}

struct Handler(MethodDescriptor);

impl UnaryService<DynamicMessage> for Handler {
    type Response = DynamicMessage;
    type Future = BoxFuture<tonic::Response<DynamicMessage>, Status>;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let method = self.0.clone();
        Box::pin(async move {
            let output = method.output();
            match method.name() {
                "SayHello" => {
                    let bytes = request.into_inner().encode_to_vec();
                    DynamicMessage::decode(output, bytes.as_slice())
                        .map(tonic::Response::new)
                        .map_err(|e| Status::internal(e.to_string()))
                }
                "Fail" => Err(Status::internal("boom")),
                _ => Ok(tonic::Response::new(DynamicMessage::new(output))),
            }
        })
    }
}

impl<B> Service<http::Request<B>> for EchoGreeter
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        match self.method(req.uri().path()) {
            Some(method) => Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(DynamicCodec::new(method.input()));
                Ok(grpc.unary(Handler(method), req).await)
            }),
            None => Box::pin(async move {
                let mut response = http::Response::new(empty_body());
                let headers = response.headers_mut();
                headers.insert(Status::GRPC_STATUS, (tonic::Code::Unimplemented as i32).into());
                headers.insert(http::header::CONTENT_TYPE, tonic::metadata::GRPC_CONTENT_TYPE);
                Ok(response)
            }),
        }
    }
}

/// Start the greeter backend on `addr`.
pub async fn start_greeter(addr: SocketAddr) {
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(EchoGreeter::new())
            .serve(addr)
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// Serve a gateway for `config` on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, rpc_gateway::Shutdown) {
    let server = rpc_gateway::GatewayServer::new(config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = rpc_gateway::Shutdown::new();
    let (_, updates) = tokio::sync::mpsc::unbounded_channel();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, updates, rx).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

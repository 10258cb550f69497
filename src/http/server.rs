//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router sending every method and path to the gateway handler
//! - Wire up middleware (tracing, request ID)
//! - Bound each request by `timeouts.request_secs`, answering with an envelope
//! - Bind server to listener
//! - Apply route table reloads while serving
//! - Stop gracefully on the shutdown signal

use axum::{
    body::Body,
    extract::State,
    http::Request,
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tonic::Status;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::{Dispatcher, Outcome, RemoteError};
use crate::http::request::{request_id, InboundRequest, MakeRequestUuid};
use crate::http::response::{normalize, ResponseEnvelope};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
    pub request_timeout: Duration,
}

/// HTTP front end of the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
}

impl GatewayServer {
    /// Create a server calling real gRPC endpoints.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a server around an existing dispatcher.
    pub fn with_dispatcher(config: GatewayConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher: dispatcher.clone(),
            max_body_size: config.security.max_body_size,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };
        let router = Self::build_router(state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving elsewhere or for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, applying configs from `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.dispatcher.routes().len(),
            "HTTP server starting"
        );

        tokio::spawn(apply_reloads(
            self.dispatcher.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_reloads(
    dispatcher: Arc<Dispatcher>,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    if let Err(e) = dispatcher.reload(&config.routes) {
                        tracing::error!(error = %e, "Failed to apply route table");
                    }
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

/// Gateway handler: normalize, dispatch, answer with an envelope.
async fn gateway_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> ResponseEnvelope {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let envelope = match tokio::time::timeout(
        state.request_timeout,
        handle(&state, request, &request_id),
    )
    .await
    {
        Ok(envelope) => envelope,
        Err(_) => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "Request deadline exceeded");
            let status = Status::deadline_exceeded(format!(
                "request not completed within {}s",
                state.request_timeout.as_secs()
            ));
            normalize(Outcome::RemoteFailure(RemoteError::from(&status)))
        }
    };

    metrics::record_request(&method, envelope.code, start_time);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        code = envelope.code,
        latency_ms = start_time.elapsed().as_millis() as u64,
        "Request completed"
    );
    envelope
}

async fn handle(state: &AppState, request: Request<Body>, request_id: &str) -> ResponseEnvelope {
    let inbound = match InboundRequest::from_http(request, state.max_body_size).await {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Unreadable request");
            return ResponseEnvelope::from(&e);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %inbound.method,
        path = %inbound.path,
        "Dispatching request"
    );

    normalize(state.dispatcher.dispatch(&inbound).await)
}

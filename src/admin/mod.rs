//! Operator API.
//!
//! Served on its own listener, every endpoint behind a bearer key.
//!
//! ```text
//! GET  /admin/status               version, route/client/schema counts
//! GET  /admin/routes               route table in order
//! GET  /admin/clients              live RPC clients
//! GET  /admin/schemas              cached schema packages
//! POST /admin/schemas/invalidate   drop cached schemas (?package=P for one)
//! POST /admin/clients/clear        drop every RPC client
//! ```

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::gateway::Dispatcher;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub dispatcher: Arc<Dispatcher>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(dispatcher: Arc<Dispatcher>, api_key: &str) -> Self {
        Self {
            dispatcher,
            api_key: Arc::from(api_key),
        }
    }
}

/// Build the admin router.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(handlers::get_status))
        .route("/admin/routes", get(handlers::get_routes))
        .route("/admin/clients", get(handlers::get_clients))
        .route("/admin/clients/clear", post(handlers::clear_clients))
        .route("/admin/schemas", get(handlers::get_schemas))
        .route("/admin/schemas/invalidate", post(handlers::invalidate_schemas))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API starting");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub routes: usize,
    pub clients: usize,
    pub cached_schemas: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteSummary {
    pub url: String,
    pub method: String,
    pub service: String,
    pub endpoint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientSummary {
    pub endpoint: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateParams {
    pub package: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        routes: state.dispatcher.routes().len(),
        clients: state.dispatcher.clients().len(),
        cached_schemas: state.dispatcher.schemas().cached_packages().len(),
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteSummary>> {
    let routes = state.dispatcher.routes();
    Json(
        routes
            .routes()
            .iter()
            .map(|r| RouteSummary {
                url: r.path.clone(),
                method: r.http_method.to_string(),
                service: r.service.to_string(),
                endpoint: r.endpoint.to_string(),
            })
            .collect(),
    )
}

pub async fn get_clients(State(state): State<AdminState>) -> Json<Vec<ClientSummary>> {
    Json(
        state
            .dispatcher
            .clients()
            .keys()
            .into_iter()
            .map(|k| ClientSummary {
                endpoint: k.endpoint.to_string(),
                service: k.service,
            })
            .collect(),
    )
}

pub async fn get_schemas(State(state): State<AdminState>) -> Json<Vec<String>> {
    Json(state.dispatcher.schemas().cached_packages())
}

pub async fn invalidate_schemas(
    State(state): State<AdminState>,
    Query(params): Query<InvalidateParams>,
) -> Json<serde_json::Value> {
    let schemas = state.dispatcher.schemas();
    let invalidated = match params.package.as_deref() {
        Some(package) => usize::from(schemas.invalidate(package)),
        None => schemas.invalidate_all(),
    };
    Json(serde_json::json!({ "invalidated": invalidated }))
}

pub async fn clear_clients(State(state): State<AdminState>) -> Json<serde_json::Value> {
    let cleared = state.dispatcher.clients().clear();
    tracing::info!(cleared, "Cleared RPC clients via admin API");
    Json(serde_json::json!({ "cleared": cleared }))
}

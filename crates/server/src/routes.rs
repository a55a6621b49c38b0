use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::{ServiceRegistry, ServiceRequest, ServiceResponse};

use crate::observability::{encode_metrics, record_request};

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceRegistry>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}

fn respond(service: &str, resp: ServiceResponse) -> Json<ServiceResponse> {
    record_request(service, &resp);
    Json(resp)
}

// Every envelope is answered with 200; failure state travels in the body.
async fn forums(State(state): State<AppState>, Json(req): Json<ServiceRequest>) -> Json<ServiceResponse> {
    respond("forum", state.services.forums.handle(&req).await)
}

async fn comments(State(state): State<AppState>, Json(req): Json<ServiceRequest>) -> Json<ServiceResponse> {
    respond("comment", state.services.comments.handle(&req).await)
}

async fn flags(State(state): State<AppState>, Json(req): Json<ServiceRequest>) -> Json<ServiceResponse> {
    respond("flag", state.services.flags.handle(&req).await)
}

async fn files(State(state): State<AppState>, Json(req): Json<ServiceRequest>) -> Json<ServiceResponse> {
    respond("file", state.services.files.handle(&req).await)
}

/// Build the application router: service endpoints, health and metrics
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let services = Router::new()
        .route("/forums", post(forums))
        .route("/comments", post(comments))
        .route("/flags", post(flags))
        .route("/files", post(files))
        .with_state(state);

    public
        .merge(services)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

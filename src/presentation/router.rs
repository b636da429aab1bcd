use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    check_quota_handler, get_tenant_handler, health_handler, object_created_handler,
    query_handler, query_stream_handler, spend_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/events/object-created", post(object_created_handler))
        .route("/api/v1/tenants/{tenant_id}", get(get_tenant_handler))
        .route("/api/v1/tenants/{tenant_id}/quota", get(check_quota_handler))
        .route("/api/v1/tenants/{tenant_id}/spend", post(spend_handler))
        .route("/api/v1/query", post(query_handler))
        .route("/api/v1/query/stream", post(query_stream_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

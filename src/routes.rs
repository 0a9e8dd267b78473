// routes.rs
use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{auth::auth_handler, bookings::bookings_handler, services::services_handler},
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

async fn db_health_check(Extension(app_state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match app_state.db_client.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "reachable" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "database": "unreachable" })),
            )
        }
    }
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/services", services_handler())
        .nest("/bookings", bookings_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state.clone()));

    let health_route = Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .layer(Extension(app_state));

    Router::new()
        .merge(health_route)
        .nest("/api", api_route)
}

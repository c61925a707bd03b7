use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod catalog;
pub mod ratings;
pub mod recommendations;
pub mod users;

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ratings/:subject_id", get(ratings::summary))
        .route("/catalog/:kind", get(catalog::list))
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::recommend),
        )
        .route("/users/:user_id/genres", get(recommendations::genres))
        .route("/users/:user_id/history", get(users::history))
        .route("/users/:user_id/bookmarks", get(users::bookmarks))
        .route(
            "/users/:user_id/titles/:subject_id/rating",
            put(users::set_rating),
        )
        .route(
            "/users/:user_id/titles/:subject_id/progress",
            put(users::record_progress),
        )
        .route(
            "/users/:user_id/titles/:subject_id/bookmark",
            put(users::set_bookmark),
        )
        .route(
            "/users/:user_id/titles/:subject_id",
            delete(users::delete_record),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Rejects blank path identifiers; returns the trimmed id
pub(crate) fn require_id<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

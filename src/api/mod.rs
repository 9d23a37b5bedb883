//! REST API adapter.
//!
//! Thin HTTP layer over [`crate::core::services::Services`] via axum.
//! This module is parallel to `cli/` - both depend on `core/` but not on
//! each other.

pub mod handlers;

use crate::core::error::SiftError;
use crate::core::services::Services;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Build the API router
pub fn router(services: Services) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/v1/search", post(handlers::search_handler))
        .route("/api/v1/index", post(handlers::index_handler))
        .route("/api/v1/refs/delete", post(handlers::delete_refs_handler))
        .layer(CorsLayer::permissive())
        .with_state(services)
}

/// HTTP status for an error
pub fn status_code(err: &SiftError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_bad_request() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Wrapper so handlers can return `Result<_, ApiError>` with `?`
pub struct ApiError(pub SiftError);

impl From<SiftError> for ApiError {
    fn from(err: SiftError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        let body = Json(json!({
            "error": self.0.message(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let model = if state.predictor.has_classifier() {
        "hybrid_physics_ml"
    } else {
        "physics_only"
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            model,
            timestamp: chrono::Utc::now(),
        }),
    )
}

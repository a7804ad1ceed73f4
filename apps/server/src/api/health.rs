use std::sync::Arc;

use axum::{routing::get, Json, Router};

use crate::{main_lib::AppState, models::HealthResponse};

#[utoipa::path(get, path = "/api/health", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

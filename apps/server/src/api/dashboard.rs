use std::sync::Arc;

use axum::{extract::State, routing::get, Extension, Json, Router};

use kgiq_core::dashboard::DashboardSummary;

use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<DashboardSummary>> {
    let summary = state
        .dashboard_service
        .summary(ctx.family_id(), ctx.today())?;
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use kgiq_core::reports::{
    ExportFormat, GenerateReportRequest, GeneratedReport, NewScheduledReport, ScheduledReport,
    ScheduledReportUpdate,
};

use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

#[derive(Deserialize, Default)]
struct ListQuery {
    limit: Option<i64>,
}

#[derive(Deserialize, Default)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<GenerateReportRequest>,
) -> ApiResult<(StatusCode, Json<GeneratedReport>)> {
    ctx.require_write()?;
    let report = state
        .report_service
        .generate_report(ctx.family_id(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn list_reports(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<GeneratedReport>>> {
    let reports = state
        .report_service
        .list_reports(ctx.family_id(), query.limit)?;
    Ok(Json(reports))
}

async fn get_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<GeneratedReport>> {
    let report = state.report_service.get_report(ctx.family_id(), &id)?;
    Ok(Json(report))
}

async fn delete_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .report_service
        .delete_report(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let export = state
        .report_service
        .export_report(ctx.family_id(), &id, query.format)?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    ))
}

async fn list_schedules(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ScheduledReport>>> {
    let schedules = state.report_service.list_schedules(ctx.family_id())?;
    Ok(Json(schedules))
}

async fn get_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<ScheduledReport>> {
    let schedule = state.report_service.get_schedule(ctx.family_id(), &id)?;
    Ok(Json(schedule))
}

async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(schedule): Json<NewScheduledReport>,
) -> ApiResult<(StatusCode, Json<ScheduledReport>)> {
    ctx.require_write()?;
    let schedule = state
        .report_service
        .create_schedule(ctx.family_id(), schedule, ctx.today())
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn update_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<ScheduledReportUpdate>,
) -> ApiResult<Json<ScheduledReport>> {
    ctx.require_write()?;
    let schedule = state
        .report_service
        .update_schedule(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(schedule))
}

async fn delete_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .report_service
        .delete_schedule(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn run_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<(StatusCode, Json<GeneratedReport>)> {
    ctx.require_write()?;
    let report = state
        .report_service
        .run_now(ctx.family_id(), &id, ctx.today())
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/generate", post(generate_report))
        .route(
            "/reports/scheduled",
            get(list_schedules).post(create_schedule),
        )
        .route(
            "/reports/scheduled/{id}",
            get(get_schedule)
                .put(update_schedule)
                .delete(delete_schedule),
        )
        .route("/reports/scheduled/{id}/run", post(run_schedule))
        .route("/reports/{id}", get(get_report).delete(delete_report))
        .route("/reports/{id}/export", get(export_report))
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use kgiq_core::attribution::{IncomeBalanceSummary, PaymentAttribution};
use kgiq_core::budget::BudgetAllocation;
use kgiq_core::income::{IncomeEvent, IncomeEventUpdate, IncomeFilter, MarkReceived, NewIncomeEvent};

use super::UpcomingQuery;
use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRecurring {
    occurrences: u32,
}

async fn list_income_events(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(filter): Query<IncomeFilter>,
) -> ApiResult<Json<Vec<IncomeEvent>>> {
    let events = state
        .income_service
        .list_income_events(ctx.family_id(), filter)?;
    Ok(Json(events))
}

async fn upcoming_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<IncomeEvent>>> {
    let events = state
        .income_service
        .upcoming_income(ctx.family_id(), ctx.today(), query.days())?;
    Ok(Json(events))
}

async fn get_income_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<IncomeEvent>> {
    let event = state.income_service.get_income_event(ctx.family_id(), &id)?;
    Ok(Json(event))
}

async fn create_income_event(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(income): Json<NewIncomeEvent>,
) -> ApiResult<(StatusCode, Json<IncomeEvent>)> {
    ctx.require_write()?;
    let event = state
        .income_service
        .create_income_event(ctx.family_id(), income)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_income_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<IncomeEventUpdate>,
) -> ApiResult<Json<IncomeEvent>> {
    ctx.require_write()?;
    let event = state
        .income_service
        .update_income_event(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(event))
}

async fn delete_income_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .income_service
        .delete_income_event(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_received(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    body: Option<Json<MarkReceived>>,
) -> ApiResult<Json<IncomeEvent>> {
    ctx.require_write()?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let event = state
        .income_service
        .mark_received(ctx.family_id(), &id, request, ctx.today())
        .await?;
    Ok(Json(event))
}

async fn revert_received(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<IncomeEvent>> {
    ctx.require_write()?;
    let event = state
        .income_service
        .revert_received(ctx.family_id(), &id)
        .await?;
    Ok(Json(event))
}

async fn cancel_income_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<IncomeEvent>> {
    ctx.require_write()?;
    let event = state
        .income_service
        .cancel_income_event(ctx.family_id(), &id)
        .await?;
    Ok(Json(event))
}

async fn generate_recurring(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<GenerateRecurring>,
) -> ApiResult<(StatusCode, Json<Vec<IncomeEvent>>)> {
    ctx.require_write()?;
    let events = state
        .income_service
        .generate_recurring(ctx.family_id(), &id, request.occurrences)
        .await?;
    Ok((StatusCode::CREATED, Json(events)))
}

async fn list_income_attributions(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PaymentAttribution>>> {
    let attributions = state
        .attribution_service
        .list_income_attributions(ctx.family_id(), &id)?;
    Ok(Json(attributions))
}

async fn income_balance(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<IncomeBalanceSummary>> {
    let balance = state
        .attribution_service
        .income_balance(ctx.family_id(), &id)?;
    Ok(Json(balance))
}

async fn list_allocations(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BudgetAllocation>>> {
    let allocations = state
        .budget_service
        .list_allocations(ctx.family_id(), &id)?;
    Ok(Json(allocations))
}

async fn generate_allocations(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BudgetAllocation>>> {
    ctx.require_write()?;
    let allocations = state
        .budget_service
        .generate_allocations(ctx.family_id(), &id)
        .await?;
    Ok(Json(allocations))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/income-events",
            get(list_income_events).post(create_income_event),
        )
        .route("/income-events/upcoming", get(upcoming_income))
        .route(
            "/income-events/{id}",
            get(get_income_event)
                .put(update_income_event)
                .delete(delete_income_event),
        )
        .route("/income-events/{id}/mark-received", post(mark_received))
        .route("/income-events/{id}/revert-received", post(revert_received))
        .route("/income-events/{id}/cancel", post(cancel_income_event))
        .route(
            "/income-events/{id}/generate-recurring",
            post(generate_recurring),
        )
        .route(
            "/income-events/{id}/attributions",
            get(list_income_attributions),
        )
        .route("/income-events/{id}/balance", get(income_balance))
        .route(
            "/income-events/{id}/allocations",
            get(list_allocations).post(generate_allocations),
        )
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use kgiq_core::budget::{
    BudgetCategory, BudgetCategoryUpdate, BudgetPerformance, NewBudgetCategory, PercentageSummary,
};
use kgiq_core::utils::first_of_month;

use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    include_inactive: bool,
}

/// Defaults to the current month up to today.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PerformanceQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    category_ids: Vec<String>,
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<BudgetCategory>>> {
    let categories = state
        .budget_service
        .list_categories(ctx.family_id(), query.include_inactive)?;
    Ok(Json(categories))
}

async fn get_category(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<BudgetCategory>> {
    let category = state.budget_service.get_category(ctx.family_id(), &id)?;
    Ok(Json(category))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(category): Json<NewBudgetCategory>,
) -> ApiResult<(StatusCode, Json<BudgetCategory>)> {
    ctx.require_write()?;
    let category = state
        .budget_service
        .create_category(ctx.family_id(), category)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<BudgetCategoryUpdate>,
) -> ApiResult<Json<BudgetCategory>> {
    ctx.require_write()?;
    let category = state
        .budget_service
        .update_category(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(category))
}

async fn delete_category(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .budget_service
        .delete_category(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_categories(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<BudgetCategory>>> {
    ctx.require_write()?;
    let categories = state
        .budget_service
        .reorder_categories(ctx.family_id(), request.category_ids)
        .await?;
    Ok(Json(categories))
}

async fn percentage_summary(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<PercentageSummary>> {
    let summary = state.budget_service.percentage_summary(ctx.family_id())?;
    Ok(Json(summary))
}

async fn budget_performance(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<PerformanceQuery>,
) -> ApiResult<Json<BudgetPerformance>> {
    let today = ctx.today();
    let end = query.end_date.unwrap_or(today);
    let start = query.start_date.unwrap_or_else(|| first_of_month(end));
    let performance = state
        .budget_service
        .budget_performance(ctx.family_id(), start, end)?;
    Ok(Json(performance))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/budget-categories",
            get(list_categories).post(create_category),
        )
        .route("/budget-categories/summary", get(percentage_summary))
        .route("/budget-categories/reorder", put(reorder_categories))
        .route("/budget-categories/performance", get(budget_performance))
        .route(
            "/budget-categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

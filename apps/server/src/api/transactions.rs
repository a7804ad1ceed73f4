use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use kgiq_core::bank::{
    BulkCategorize, NewTransaction, Transaction, TransactionFilter, TransactionPage,
    TransactionUpdate,
};

use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState, models::CountResponse};

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Json<TransactionPage>> {
    let page = state
        .transaction_service
        .list_transactions(ctx.family_id(), filter)?;
    Ok(Json(page))
}

async fn get_transaction(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .transaction_service
        .get_transaction(ctx.family_id(), &id)?;
    Ok(Json(transaction))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(transaction): Json<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    ctx.require_write()?;
    let transaction = state
        .transaction_service
        .create_transaction(ctx.family_id(), transaction)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn update_transaction(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<TransactionUpdate>,
) -> ApiResult<Json<Transaction>> {
    ctx.require_write()?;
    let transaction = state
        .transaction_service
        .update_transaction(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(transaction))
}

async fn delete_transaction(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .transaction_service
        .delete_transaction(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_categorize(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<BulkCategorize>,
) -> ApiResult<Json<CountResponse>> {
    ctx.require_write()?;
    let count = state
        .transaction_service
        .bulk_categorize(
            ctx.family_id(),
            request.transaction_ids,
            request.budget_category_id,
        )
        .await?;
    Ok(Json(CountResponse { count }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/bulk-categorize", post(bulk_categorize))
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use kgiq_core::bank::{
    BankAccount, BankAccountUpdate, BankConnection, ConnectRequest, LinkToken, NewBankAccount,
    SyncSummary,
};

use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkedConnection {
    connection: BankConnection,
    accounts: Vec<BankAccount>,
}

async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<BankAccount>>> {
    let accounts = state
        .account_service
        .list_accounts(ctx.family_id(), query.include_inactive)?;
    Ok(Json(accounts))
}

async fn get_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<BankAccount>> {
    let account = state.account_service.get_account(ctx.family_id(), &id)?;
    Ok(Json(account))
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(account): Json<NewBankAccount>,
) -> ApiResult<(StatusCode, Json<BankAccount>)> {
    ctx.require_write()?;
    let account = state
        .account_service
        .create_account(ctx.family_id(), &ctx.family.currency, account)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<BankAccountUpdate>,
) -> ApiResult<Json<BankAccount>> {
    ctx.require_write()?;
    let account = state
        .account_service
        .update_account(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(account))
}

async fn delete_account(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .account_service
        .delete_account(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_link_token(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<LinkToken>> {
    ctx.require_write()?;
    let token = state.sync_service.create_link_token(&ctx.member.id).await?;
    Ok(Json(token))
}

async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ConnectRequest>,
) -> ApiResult<(StatusCode, Json<LinkedConnection>)> {
    ctx.require_write()?;
    let (connection, accounts) = state
        .sync_service
        .link(
            ctx.family_id(),
            &request.public_token,
            request.institution_name,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(LinkedConnection {
            connection,
            accounts,
        }),
    ))
}

async fn list_connections(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BankConnection>>> {
    let connections = state.sync_service.list_connections(ctx.family_id())?;
    Ok(Json(connections))
}

async fn sync_family(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SyncSummary>>> {
    ctx.require_write()?;
    let summaries = state.sync_service.sync_family(ctx.family_id()).await?;
    Ok(Json(summaries))
}

async fn sync_connection(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<SyncSummary>> {
    ctx.require_write()?;
    let summary = state
        .sync_service
        .sync_connection(ctx.family_id(), &id)
        .await?;
    Ok(Json(summary))
}

async fn disconnect(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<BankConnection>> {
    ctx.require_write()?;
    let connection = state
        .sync_service
        .disconnect(ctx.family_id(), &id)
        .await?;
    Ok(Json(connection))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bank-accounts", get(list_accounts).post(create_account))
        .route("/bank-accounts/link-token", post(create_link_token))
        .route("/bank-accounts/connect", post(connect))
        .route("/bank-accounts/sync", post(sync_family))
        .route("/bank-accounts/connections", get(list_connections))
        .route("/bank-accounts/connections/{id}", delete(disconnect))
        .route("/bank-accounts/connections/{id}/sync", post(sync_connection))
        .route(
            "/bank-accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};

use kgiq_core::attribution::{AttributionUpdate, FundingSummary, NewAttribution, PaymentAttribution};
use kgiq_core::payments::{
    MarkPaid, NewPayment, Payment, PaymentFilter, PaymentTransitionOutcome, PaymentUpdate,
};

use super::UpcomingQuery;
use crate::{auth::AuthContext, error::ApiResult, main_lib::AppState};

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = state.payment_service.list_payments(ctx.family_id(), filter)?;
    Ok(Json(payments))
}

async fn upcoming_payments(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = state
        .payment_service
        .upcoming_payments(ctx.family_id(), ctx.today(), query.days())?;
    Ok(Json(payments))
}

async fn overdue_payments(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = state.payment_service.overdue_payments(ctx.family_id())?;
    Ok(Json(payments))
}

async fn get_payment(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Payment>> {
    let payment = state.payment_service.get_payment(ctx.family_id(), &id)?;
    Ok(Json(payment))
}

async fn create_payment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payment): Json<NewPayment>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    ctx.require_write()?;
    let payment = state
        .payment_service
        .create_payment(ctx.family_id(), payment)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn update_payment(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<PaymentUpdate>,
) -> ApiResult<Json<Payment>> {
    ctx.require_write()?;
    let payment = state
        .payment_service
        .update_payment(ctx.family_id(), &id, update, ctx.today())
        .await?;
    Ok(Json(payment))
}

async fn delete_payment(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .payment_service
        .delete_payment(ctx.family_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_paid(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    body: Option<Json<MarkPaid>>,
) -> ApiResult<Json<PaymentTransitionOutcome>> {
    ctx.require_write()?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let outcome = state
        .payment_service
        .mark_paid(ctx.family_id(), &id, request, ctx.today())
        .await?;
    Ok(Json(outcome))
}

async fn revert_paid(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Payment>> {
    ctx.require_write()?;
    let payment = state
        .payment_service
        .revert_paid(ctx.family_id(), &id, ctx.today())
        .await?;
    Ok(Json(payment))
}

async fn cancel_payment(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Payment>> {
    ctx.require_write()?;
    let payment = state
        .payment_service
        .cancel_payment(ctx.family_id(), &id)
        .await?;
    Ok(Json(payment))
}

async fn list_attributions(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PaymentAttribution>>> {
    let attributions = state
        .attribution_service
        .list_payment_attributions(ctx.family_id(), &id)?;
    Ok(Json(attributions))
}

async fn create_attribution(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(attribution): Json<NewAttribution>,
) -> ApiResult<(StatusCode, Json<PaymentAttribution>)> {
    ctx.require_write()?;
    let attribution = state
        .attribution_service
        .create_attribution(ctx.family_id(), &id, attribution)
        .await?;
    Ok((StatusCode::CREATED, Json(attribution)))
}

async fn update_attribution(
    Path((id, attribution_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<AttributionUpdate>,
) -> ApiResult<Json<PaymentAttribution>> {
    ctx.require_write()?;
    let attribution = state
        .attribution_service
        .update_attribution(ctx.family_id(), &id, &attribution_id, update.amount)
        .await?;
    Ok(Json(attribution))
}

async fn delete_attribution(
    Path((id, attribution_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_write()?;
    state
        .attribution_service
        .delete_attribution(ctx.family_id(), &id, &attribution_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn auto_attribute(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PaymentAttribution>>> {
    ctx.require_write()?;
    let attributions = state
        .attribution_service
        .auto_attribute(ctx.family_id(), &id)
        .await?;
    Ok(Json(attributions))
}

async fn payment_funding(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<FundingSummary>> {
    let funding = state
        .attribution_service
        .payment_funding(ctx.family_id(), &id)?;
    Ok(Json(funding))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/upcoming", get(upcoming_payments))
        .route("/payments/overdue", get(overdue_payments))
        .route(
            "/payments/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .route("/payments/{id}/mark-paid", post(mark_paid))
        .route("/payments/{id}/revert-paid", post(revert_paid))
        .route("/payments/{id}/cancel", post(cancel_payment))
        .route(
            "/payments/{id}/attributions",
            get(list_attributions).post(create_attribution),
        )
        .route(
            "/payments/{id}/attributions/{attribution_id}",
            put(update_attribution).delete(delete_attribution),
        )
        .route("/payments/{id}/auto-attribute", post(auto_attribute))
        .route("/payments/{id}/funding", get(payment_funding))
}

use std::sync::Arc;

use axum::{http::HeaderValue, middleware, routing::get, Json, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use serde::Deserialize;
use utoipa::OpenApi;

use crate::{auth::require_jwt, config::Config, main_lib::AppState, models};

pub mod auth;
pub mod bank_accounts;
pub mod budget;
pub mod dashboard;
pub mod families;
pub mod health;
pub mod income;
pub mod payments;
pub mod reports;
pub mod transactions;

const DEFAULT_UPCOMING_DAYS: u32 = 30;
const MAX_UPCOMING_DAYS: u32 = 366;

/// `?days=` window of the upcoming payment and income lists.
#[derive(Deserialize, Default)]
struct UpcomingQuery {
    days: Option<u32>,
}

impl UpcomingQuery {
    fn days(&self) -> u32 {
        self.days
            .unwrap_or(DEFAULT_UPCOMING_DAYS)
            .min(MAX_UPCOMING_DAYS)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        auth::change_password,
    ),
    components(schemas(
        models::Family,
        models::Member,
        models::RegisterBody,
        models::LoginRequest,
        models::RefreshRequest,
        models::ChangePasswordRequest,
        models::SessionResponse,
        models::MeResponse,
        models::HealthResponse,
    )),
    tags((name = "kgiq", description = "KGiQ Family Finance API"))
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(families::router())
        .merge(bank_accounts::router())
        .merge(transactions::router())
        .merge(income::router())
        .merge(payments::router())
        .merge(budget::router())
        .merge(reports::router())
        .merge(dashboard::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_jwt));

    let api = Router::new()
        .merge(health::router())
        .merge(auth::public_router())
        .route("/openapi.json", get(openapi))
        .merge(protected);

    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok());
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

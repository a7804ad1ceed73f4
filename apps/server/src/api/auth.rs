use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{Extensions, HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};

use kgiq_core::errors::Error as CoreError;
use kgiq_core::families::{Family, FamilyMember};

use crate::{
    auth::{AuthContext, TokenType},
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{
        ChangePasswordRequest, LoginRequest, MeResponse, RefreshRequest, RegisterBody,
        SessionResponse,
    },
};

fn issue_session(
    state: &AppState,
    member: FamilyMember,
    family: Family,
) -> ApiResult<SessionResponse> {
    let access_token = state.auth.issue_token(&member, TokenType::Access)?;
    let refresh_token = state.auth.issue_token(&member, TokenType::Refresh)?;
    Ok(SessionResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.access_ttl().as_secs(),
        member: member.into(),
        family: family.into(),
    })
}

/// First `X-Forwarded-For` hop, else the peer address.
fn client_key(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterBody,
    responses((status = 201, body = SessionResponse))
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let (family, member) = state.auth_service.register(body.into()).await?;
    tracing::info!("Registered family {} with admin {}", family.id, member.id);
    let session = issue_session(&state, member, family)?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = SessionResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let email_key = format!("email:{}", body.email.trim().to_lowercase());
    let client_key = format!("client:{}", client_key(&headers, &extensions));
    if !state.login_limiter.try_acquire(&[&email_key, &client_key]) {
        tracing::warn!("Login throttled for {}", client_key);
        return Err(ApiError::TooManyRequests(
            "Too many login attempts, try again later".to_string(),
        ));
    }

    let member = state
        .auth_service
        .authenticate(&body.email, &body.password)
        .await?;
    state.login_limiter.reset(&email_key);

    let (member, family) = state.auth_service.load_member(&member.id)?;
    Ok(Json(issue_session(&state, member, family)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses((status = 200, body = SessionResponse), (status = 401))
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let claims = state
        .auth
        .validate_token(&body.refresh_token, TokenType::Refresh)?;
    let (member, family) = match state.auth_service.load_member(&claims.sub) {
        Ok(loaded) => loaded,
        Err(CoreError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("Unauthorized".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if member.family_id != claims.fid {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }
    Ok(Json(issue_session(&state, member, family)?))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, body = MeResponse), (status = 401))
)]
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse {
        member: ctx.member.into(),
        family: ctx.family.into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses((status = 204), (status = 400), (status = 401))
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth_service
        .change_password(&ctx.member.id, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Routes reachable without a token.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use kgiq_core::families::{FamilyUpdate, MemberUpdate, NewFamilyMember};

use crate::{
    auth::AuthContext,
    error::ApiResult,
    main_lib::AppState,
    models::{Family, Member},
};

async fn get_family(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Family>> {
    let family = state.family_service.get_family(ctx.family_id())?;
    Ok(Json(family.into()))
}

async fn update_family(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<FamilyUpdate>,
) -> ApiResult<Json<Family>> {
    ctx.require_admin()?;
    let family = state
        .family_service
        .update_family(ctx.family_id(), update)
        .await?;
    Ok(Json(family.into()))
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Member>>> {
    let members = state.family_service.list_members(ctx.family_id())?;
    Ok(Json(members.into_iter().map(Member::from).collect()))
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(member): Json<NewFamilyMember>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    ctx.require_admin()?;
    let member = state
        .family_service
        .add_member(ctx.family_id(), member)
        .await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

async fn get_member(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Member>> {
    let member = state.family_service.get_member(ctx.family_id(), &id)?;
    Ok(Json(member.into()))
}

async fn update_member(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(update): Json<MemberUpdate>,
) -> ApiResult<Json<Member>> {
    ctx.require_admin()?;
    let member = state
        .family_service
        .update_member(ctx.family_id(), &id, update)
        .await?;
    Ok(Json(member.into()))
}

async fn remove_member(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    ctx.require_admin()?;
    state
        .family_service
        .remove_member(ctx.family_id(), &ctx.member.id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/families", get(get_family).put(update_family))
        .route("/families/members", get(list_members).post(add_member))
        .route(
            "/families/members/{id}",
            get(get_member).put(update_member).delete(remove_member),
        )
}

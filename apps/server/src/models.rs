//! Request and response bodies owned by the HTTP layer.
//!
//! Domain payloads are serialized straight from `kgiq_core` types; the
//! structs here cover the session endpoints and the few envelopes the
//! handlers add on top.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use kgiq_core::families::{self as core_families, RegisterRequest};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub timezone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<core_families::Family> for Family {
    fn from(f: core_families::Family) -> Self {
        Self {
            id: f.id,
            name: f.name,
            currency: f.currency,
            timezone: f.timezone,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub family_id: String,
    pub email: String,
    pub name: String,
    /// ADMIN, EDITOR or VIEWER.
    pub role: String,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<core_families::FamilyMember> for Member {
    fn from(m: core_families::FamilyMember) -> Self {
        let role = m.role.as_str().to_string();
        Self {
            id: m.id,
            family_id: m.family_id,
            email: m.email,
            name: m.name,
            role,
            last_login_at: m.last_login_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub family_name: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub currency: Option<String>,
    pub timezone: Option<String>,
}

impl From<RegisterBody> for RegisterRequest {
    fn from(body: RegisterBody) -> Self {
        Self {
            family_name: body.family_name,
            name: body.name,
            email: body.email,
            password: body.password,
            currency: body.currency,
            timezone: body.timezone,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub member: Member,
    pub family: Family,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub member: Member,
    pub family: Family,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Number of rows touched by a bulk operation.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: usize,
}

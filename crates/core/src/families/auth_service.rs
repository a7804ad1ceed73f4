//! Registration, login and password changes.

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::families_model::{
    normalize_email, validate_email, validate_password, Family, FamilyMember, MemberRole,
    NewFamily, NewMemberRecord,
};
use super::families_traits::{FamilyRepositoryTrait, PasswordHasherTrait};
use crate::constants::{DEFAULT_CURRENCY, DEFAULT_TIMEZONE};
use crate::errors::{Error, Result};

/// Input for creating a new family together with its first administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub family_name: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub currency: Option<String>,
    pub timezone: Option<String>,
}

#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<(Family, FamilyMember)>;

    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<FamilyMember>;

    async fn change_password(
        &self,
        member_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()>;

    /// Loads a member and its family, e.g. to refresh a session.
    fn load_member(&self, member_id: &str) -> Result<(FamilyMember, Family)>;
}

pub struct AuthService {
    repository: Arc<dyn FamilyRepositoryTrait>,
    hasher: Arc<dyn PasswordHasherTrait>,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn FamilyRepositoryTrait>,
        hasher: Arc<dyn PasswordHasherTrait>,
    ) -> Self {
        Self { repository, hasher }
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    async fn register(&self, request: RegisterRequest) -> Result<(Family, FamilyMember)> {
        validate_email(&request.email)?;
        validate_password(&request.password)?;
        if request.name.trim().is_empty() {
            return Err(Error::invalid_input("Name cannot be empty"));
        }

        let new_family = NewFamily {
            name: request.family_name.trim().to_string(),
            currency: request
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            timezone: request
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        };
        new_family.validate()?;

        let email = normalize_email(&request.email);
        if self.repository.find_credentials_by_email(&email)?.is_some() {
            return Err(Error::Conflict(format!(
                "An account with email '{}' already exists",
                email
            )));
        }

        let admin = NewMemberRecord {
            email,
            name: request.name.trim().to_string(),
            role: MemberRole::Admin,
            password_hash: self.hasher.hash_password(&request.password)?,
        };
        let (family, member) = self.repository.create_with_admin(new_family, admin).await?;
        info!("Registered family {} with admin {}", family.id, member.id);
        Ok((family, member))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<FamilyMember> {
        let email = normalize_email(email);
        let Some(credentials) = self.repository.find_credentials_by_email(&email)? else {
            return Err(Error::InvalidCredentials);
        };
        if !self
            .hasher
            .verify_password(password, &credentials.password_hash)?
        {
            warn!("Failed login for member {}", credentials.member.id);
            return Err(Error::InvalidCredentials);
        }
        let now = Utc::now().naive_utc();
        self.repository
            .record_login(&credentials.member.id, now)
            .await?;
        Ok(FamilyMember {
            last_login_at: Some(now),
            ..credentials.member
        })
    }

    async fn change_password(
        &self,
        member_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let credentials = self.repository.get_credentials(member_id)?;
        if !self
            .hasher
            .verify_password(current_password, &credentials.password_hash)?
        {
            return Err(Error::InvalidCredentials);
        }
        validate_password(new_password)?;
        let hash = self.hasher.hash_password(new_password)?;
        self.repository.update_password(member_id, hash).await
    }

    fn load_member(&self, member_id: &str) -> Result<(FamilyMember, Family)> {
        let credentials = self.repository.get_credentials(member_id)?;
        let family = self.repository.get_family(&credentials.member.family_id)?;
        Ok((credentials.member, family))
    }
}

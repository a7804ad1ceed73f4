//! Family repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::families_model::{
    Family, FamilyMember, FamilyUpdate, MemberCredentials, MemberUpdate, NewFamily,
    NewFamilyMember, NewMemberRecord,
};
use crate::errors::Result;

/// Persistence contract for families and their members.
///
/// Member changes that could remove the last administrator are checked by
/// the implementation inside its write transaction.
#[async_trait]
pub trait FamilyRepositoryTrait: Send + Sync {
    /// Creates a family and its first (admin) member atomically.
    async fn create_with_admin(
        &self,
        family: NewFamily,
        admin: NewMemberRecord,
    ) -> Result<(Family, FamilyMember)>;

    fn get_family(&self, family_id: &str) -> Result<Family>;

    fn list_families(&self) -> Result<Vec<Family>>;

    async fn update_family(&self, family_id: &str, update: FamilyUpdate) -> Result<Family>;

    fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>>;

    fn get_member(&self, family_id: &str, member_id: &str) -> Result<FamilyMember>;

    fn find_credentials_by_email(&self, email: &str) -> Result<Option<MemberCredentials>>;

    fn get_credentials(&self, member_id: &str) -> Result<MemberCredentials>;

    async fn create_member(&self, family_id: &str, member: NewMemberRecord)
        -> Result<FamilyMember>;

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<FamilyMember>;

    async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<()>;

    async fn update_password(&self, member_id: &str, password_hash: String) -> Result<()>;

    async fn record_login(&self, member_id: &str, at: NaiveDateTime) -> Result<()>;
}

/// Family and member management.
#[async_trait]
pub trait FamilyServiceTrait: Send + Sync {
    fn get_family(&self, family_id: &str) -> Result<Family>;

    async fn update_family(&self, family_id: &str, update: FamilyUpdate) -> Result<Family>;

    fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>>;

    fn get_member(&self, family_id: &str, member_id: &str) -> Result<FamilyMember>;

    async fn add_member(&self, family_id: &str, member: NewFamilyMember) -> Result<FamilyMember>;

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<FamilyMember>;

    /// Removes a member. `actor_id` is the member performing the removal.
    async fn remove_member(&self, family_id: &str, actor_id: &str, member_id: &str)
        -> Result<()>;
}

/// Password hashing seam; the server supplies an argon2 implementation.
pub trait PasswordHasherTrait: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;

    /// `Ok(false)` for a wrong password, `Err` only for malformed hashes.
    fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool>;
}

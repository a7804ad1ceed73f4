use log::{debug, info};
use std::sync::Arc;

use super::families_model::{
    normalize_email, Family, FamilyMember, FamilyUpdate, MemberUpdate, NewFamilyMember,
    NewMemberRecord,
};
use super::families_traits::{FamilyRepositoryTrait, FamilyServiceTrait, PasswordHasherTrait};
use crate::errors::{Error, Result};

/// Service for families and their members
pub struct FamilyService {
    repository: Arc<dyn FamilyRepositoryTrait>,
    hasher: Arc<dyn PasswordHasherTrait>,
}

impl FamilyService {
    pub fn new(
        repository: Arc<dyn FamilyRepositoryTrait>,
        hasher: Arc<dyn PasswordHasherTrait>,
    ) -> Self {
        Self { repository, hasher }
    }
}

#[async_trait::async_trait]
impl FamilyServiceTrait for FamilyService {
    fn get_family(&self, family_id: &str) -> Result<Family> {
        self.repository.get_family(family_id)
    }

    async fn update_family(&self, family_id: &str, update: FamilyUpdate) -> Result<Family> {
        update.validate()?;
        self.repository.update_family(family_id, update).await
    }

    fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>> {
        self.repository.list_members(family_id)
    }

    fn get_member(&self, family_id: &str, member_id: &str) -> Result<FamilyMember> {
        self.repository.get_member(family_id, member_id)
    }

    async fn add_member(&self, family_id: &str, member: NewFamilyMember) -> Result<FamilyMember> {
        member.validate()?;
        let email = normalize_email(&member.email);
        if self.repository.find_credentials_by_email(&email)?.is_some() {
            return Err(Error::Conflict(format!(
                "A member with email '{}' already exists",
                email
            )));
        }
        let password_hash = self.hasher.hash_password(&member.password)?;
        let created = self
            .repository
            .create_member(
                family_id,
                NewMemberRecord {
                    email,
                    name: member.name.trim().to_string(),
                    role: member.role,
                    password_hash,
                },
            )
            .await?;
        info!("Added member {} to family {}", created.id, family_id);
        Ok(created)
    }

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<FamilyMember> {
        update.validate()?;
        debug!("Updating member {} in family {}", member_id, family_id);
        self.repository
            .update_member(family_id, member_id, update)
            .await
    }

    async fn remove_member(
        &self,
        family_id: &str,
        actor_id: &str,
        member_id: &str,
    ) -> Result<()> {
        if actor_id == member_id {
            return Err(Error::Conflict(
                "Members cannot remove themselves from the family".to_string(),
            ));
        }
        self.repository.delete_member(family_id, member_id).await?;
        info!("Removed member {} from family {}", member_id, family_id);
        Ok(())
    }
}

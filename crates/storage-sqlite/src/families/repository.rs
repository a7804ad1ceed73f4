use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::families::{
    ensure_admin_remains, Family, FamilyMember, FamilyRepositoryTrait, FamilyUpdate,
    MemberCredentials, MemberRole, MemberUpdate, NewFamily, NewMemberRecord,
};
use kgiq_core::Result;

use super::model::{FamilyDB, FamilyMemberDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{unique_as_conflict, OptionalRow, StorageError};
use crate::schema::{families, family_members};

pub struct FamilyRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FamilyRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn email_taken(email: &str) -> String {
    format!("A member with email '{}' already exists", email)
}

fn load_member(conn: &mut SqliteConnection, family: &str, member_id: &str) -> Result<FamilyMemberDB> {
    family_members::table
        .filter(family_members::id.eq(member_id))
        .filter(family_members::family_id.eq(family))
        .first::<FamilyMemberDB>(conn)
        .or_not_found("Member", member_id)
}

fn count_admins_except(conn: &mut SqliteConnection, family: &str, member_id: &str) -> Result<usize> {
    let count: i64 = family_members::table
        .filter(family_members::family_id.eq(family))
        .filter(family_members::role.eq(MemberRole::Admin.as_str()))
        .filter(family_members::id.ne(member_id))
        .count()
        .get_result(conn)
        .map_err(StorageError::from)?;
    Ok(count as usize)
}

#[async_trait]
impl FamilyRepositoryTrait for FamilyRepository {
    async fn create_with_admin(
        &self,
        family: NewFamily,
        admin: NewMemberRecord,
    ) -> Result<(Family, FamilyMember)> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<(Family, FamilyMember)> {
                let now = Utc::now().naive_utc();
                let family_db = FamilyDB {
                    id: Uuid::new_v4().to_string(),
                    name: family.name,
                    currency: family.currency,
                    timezone: family.timezone,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(families::table)
                    .values(&family_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let member_db = FamilyMemberDB {
                    id: Uuid::new_v4().to_string(),
                    family_id: family_db.id.clone(),
                    email: admin.email.clone(),
                    name: admin.name,
                    role: MemberRole::Admin.as_str().to_string(),
                    password_hash: admin.password_hash,
                    last_login_at: None,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(family_members::table)
                    .values(&member_db)
                    .execute(conn)
                    .map_err(|e| unique_as_conflict(e, email_taken(&admin.email)))?;

                Ok((Family::from(family_db), FamilyMember::from(member_db)))
            })
            .await
    }

    fn get_family(&self, family_id: &str) -> Result<Family> {
        let mut conn = get_connection(&self.pool)?;
        families::table
            .find(family_id)
            .first::<FamilyDB>(&mut conn)
            .or_not_found("Family", family_id)
            .map(Family::from)
    }

    fn list_families(&self) -> Result<Vec<Family>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = families::table
            .order(families::created_at.asc())
            .load::<FamilyDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Family::from).collect())
    }

    async fn update_family(&self, family_id: &str, update: FamilyUpdate) -> Result<Family> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Family> {
                let mut current = families::table
                    .find(&family_id)
                    .first::<FamilyDB>(conn)
                    .or_not_found("Family", &family_id)?;
                if let Some(name) = update.name {
                    current.name = name.trim().to_string();
                }
                if let Some(currency) = update.currency {
                    current.currency = currency;
                }
                if let Some(timezone) = update.timezone {
                    current.timezone = timezone;
                }
                current.updated_at = Utc::now().naive_utc();

                diesel::update(families::table.find(&family_id))
                    .set((
                        families::name.eq(&current.name),
                        families::currency.eq(&current.currency),
                        families::timezone.eq(&current.timezone),
                        families::updated_at.eq(current.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Family::from(current))
            })
            .await
    }

    fn list_members(&self, family_id: &str) -> Result<Vec<FamilyMember>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = family_members::table
            .filter(family_members::family_id.eq(family_id))
            .order(family_members::created_at.asc())
            .load::<FamilyMemberDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(FamilyMember::from).collect())
    }

    fn get_member(&self, family_id: &str, member_id: &str) -> Result<FamilyMember> {
        let mut conn = get_connection(&self.pool)?;
        load_member(&mut conn, family_id, member_id).map(FamilyMember::from)
    }

    fn find_credentials_by_email(&self, email: &str) -> Result<Option<MemberCredentials>> {
        let mut conn = get_connection(&self.pool)?;
        let row = family_members::table
            .filter(family_members::email.eq(email))
            .first::<FamilyMemberDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(MemberCredentials::from))
    }

    fn get_credentials(&self, member_id: &str) -> Result<MemberCredentials> {
        let mut conn = get_connection(&self.pool)?;
        family_members::table
            .find(member_id)
            .first::<FamilyMemberDB>(&mut conn)
            .or_not_found("Member", member_id)
            .map(MemberCredentials::from)
    }

    async fn create_member(
        &self,
        family_id: &str,
        member: NewMemberRecord,
    ) -> Result<FamilyMember> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FamilyMember> {
                let now = Utc::now().naive_utc();
                let member_db = FamilyMemberDB {
                    id: Uuid::new_v4().to_string(),
                    family_id,
                    email: member.email.clone(),
                    name: member.name,
                    role: member.role.as_str().to_string(),
                    password_hash: member.password_hash,
                    last_login_at: None,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(family_members::table)
                    .values(&member_db)
                    .execute(conn)
                    .map_err(|e| unique_as_conflict(e, email_taken(&member.email)))?;
                Ok(FamilyMember::from(member_db))
            })
            .await
    }

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        update: MemberUpdate,
    ) -> Result<FamilyMember> {
        let family_id = family_id.to_string();
        let member_id = member_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FamilyMember> {
                let mut current = load_member(conn, &family_id, &member_id)?;
                if let Some(role) = update.role {
                    let was_admin = current.role == MemberRole::Admin.as_str();
                    if was_admin && role != MemberRole::Admin {
                        ensure_admin_remains(count_admins_except(conn, &family_id, &member_id)?)?;
                    }
                    current.role = role.as_str().to_string();
                }
                if let Some(name) = update.name {
                    current.name = name.trim().to_string();
                }
                current.updated_at = Utc::now().naive_utc();

                diesel::update(family_members::table.find(&member_id))
                    .set((
                        family_members::name.eq(&current.name),
                        family_members::role.eq(&current.role),
                        family_members::updated_at.eq(current.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(FamilyMember::from(current))
            })
            .await
    }

    async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let member_id = member_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let current = load_member(conn, &family_id, &member_id)?;
                if current.role == MemberRole::Admin.as_str() {
                    ensure_admin_remains(count_admins_except(conn, &family_id, &member_id)?)?;
                }
                diesel::delete(family_members::table.find(&member_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn update_password(&self, member_id: &str, password_hash: String) -> Result<()> {
        let member_id = member_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let updated = diesel::update(family_members::table.find(&member_id))
                    .set((
                        family_members::password_hash.eq(password_hash),
                        family_members::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(kgiq_core::Error::not_found("Member", &member_id));
                }
                Ok(())
            })
            .await
    }

    async fn record_login(&self, member_id: &str, at: NaiveDateTime) -> Result<()> {
        let member_id = member_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(family_members::table.find(&member_id))
                    .set(family_members::last_login_at.eq(Some(at)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

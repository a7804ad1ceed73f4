//! Database models for families and members.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use kgiq_core::families::{Family, FamilyMember, MemberCredentials, MemberRole};

use crate::utils::parse_enum;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::families)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FamilyDB {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub timezone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(FamilyDB, foreign_key = family_id))]
#[diesel(table_name = crate::schema::family_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FamilyMemberDB {
    pub id: String,
    pub family_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<FamilyDB> for Family {
    fn from(db: FamilyDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            currency: db.currency,
            timezone: db.timezone,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<FamilyMemberDB> for MemberCredentials {
    fn from(db: FamilyMemberDB) -> Self {
        Self {
            member: FamilyMember {
                role: parse_enum(&db.role, "role", MemberRole::Viewer),
                id: db.id,
                family_id: db.family_id,
                email: db.email,
                name: db.name,
                last_login_at: db.last_login_at,
                created_at: db.created_at,
                updated_at: db.updated_at,
            },
            password_hash: db.password_hash,
        }
    }
}

impl From<FamilyMemberDB> for FamilyMember {
    fn from(db: FamilyMemberDB) -> Self {
        MemberCredentials::from(db).member
    }
}

//! Shared fixtures for repository tests.

use std::sync::Arc;

use chrono::NaiveDate;
use kgiq_core::families::{
    Family, FamilyMember, FamilyRepositoryTrait, MemberRole, NewFamily, NewMemberRecord,
};
use tempfile::TempDir;

use crate::db::{open, DbPool, WriteHandle};
use crate::families::FamilyRepository;

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    // Keeps the database directory alive for the duration of the test.
    _dir: TempDir,
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("kgiq-test.db");
    let (pool, writer) = open(&path.to_string_lossy()).expect("Failed to open test database");
    TestDb {
        pool,
        writer,
        _dir: dir,
    }
}

/// Creates a family with an admin whose email is derived from `tag`.
pub async fn seed_family(db: &TestDb, tag: &str) -> (Family, FamilyMember) {
    FamilyRepository::new(db.pool.clone(), db.writer.clone())
        .create_with_admin(
            NewFamily {
                name: format!("Family {}", tag),
                currency: "USD".to_string(),
                timezone: "America/New_York".to_string(),
            },
            NewMemberRecord {
                email: format!("{}@example.com", tag),
                name: format!("Admin {}", tag),
                role: MemberRole::Admin,
                password_hash: "hash".to_string(),
            },
        )
        .await
        .expect("Failed to seed family")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

//! Family and member domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::errors::{Error, Result};
use crate::utils::is_valid_timezone;

/// A household sharing financial data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub timezone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamily {
    pub name: String,
    pub currency: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyUpdate {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
}

impl NewFamily {
    pub fn validate(&self) -> Result<()> {
        validate_family_fields(Some(&self.name), Some(&self.currency), Some(&self.timezone))
    }
}

impl FamilyUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_family_fields(
            self.name.as_deref(),
            self.currency.as_deref(),
            self.timezone.as_deref(),
        )
    }
}

fn validate_family_fields(
    name: Option<&str>,
    currency: Option<&str>,
    timezone: Option<&str>,
) -> Result<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::invalid_input("Family name cannot be empty"));
        }
    }
    if let Some(currency) = currency {
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::invalid_input(
                "Currency must be a three-letter ISO code",
            ));
        }
    }
    if let Some(tz) = timezone {
        if !is_valid_timezone(tz) {
            return Err(Error::invalid_input(format!("Unknown timezone '{}'", tz)));
        }
    }
    Ok(())
}

/// Permission level of a family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Editor,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "ADMIN",
            MemberRole::Editor => "EDITOR",
            MemberRole::Viewer => "VIEWER",
        }
    }

    /// May create, change and delete financial data.
    pub fn can_write(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Editor)
    }

    /// May change family settings and manage members.
    pub fn can_manage_family(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ADMIN" => Ok(MemberRole::Admin),
            "EDITOR" => Ok(MemberRole::Editor),
            "VIEWER" => Ok(MemberRole::Viewer),
            other => Err(Error::invalid_input(format!("Unknown role '{}'", other))),
        }
    }
}

/// A user belonging to a family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: String,
    pub family_id: String,
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for adding a member to an existing family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyMember {
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub password: String,
}

impl NewFamilyMember {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Member name cannot be empty"));
        }
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub role: Option<MemberRole>,
}

impl MemberUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::invalid_input("Member name cannot be empty"));
            }
        }
        Ok(())
    }
}

/// Member row as persisted, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewMemberRecord {
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub password_hash: String,
}

/// A member together with the stored password hash.
#[derive(Debug, Clone)]
pub struct MemberCredentials {
    pub member: FamilyMember,
    pub password_hash: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(Error::invalid_input(format!("'{}' is not a valid email", email)));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::invalid_input(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Rejects a change that would leave the family without an administrator.
pub fn ensure_admin_remains(admins_after_change: usize) -> Result<()> {
    if admins_after_change == 0 {
        return Err(Error::Conflict(
            "A family must keep at least one administrator".to_string(),
        ));
    }
    Ok(())
}

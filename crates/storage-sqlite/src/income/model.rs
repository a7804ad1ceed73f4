//! Database model for income events.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use kgiq_core::income::{IncomeEvent, IncomeStatus};
use kgiq_core::schedule::Frequency;

use crate::utils::{parse_decimal, parse_enum, parse_optional_decimal};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::income_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IncomeEventDB {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub source: Option<String>,
    pub amount: String,
    pub scheduled_date: NaiveDate,
    pub frequency: String,
    pub status: String,
    pub actual_date: Option<NaiveDate>,
    pub actual_amount: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<IncomeEventDB> for IncomeEvent {
    fn from(db: IncomeEventDB) -> Self {
        let event = Self {
            amount: parse_decimal(&db.amount, "amount"),
            frequency: parse_enum(&db.frequency, "frequency", Frequency::Once),
            status: parse_enum(&db.status, "status", IncomeStatus::Scheduled),
            actual_amount: parse_optional_decimal(db.actual_amount.as_deref(), "actual_amount"),
            id: db.id,
            family_id: db.family_id,
            name: db.name,
            source: db.source,
            scheduled_date: db.scheduled_date,
            actual_date: db.actual_date,
            notes: db.notes,
            allocated_amount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            created_at: db.created_at,
            updated_at: db.updated_at,
        };
        event.with_allocated(Decimal::ZERO)
    }
}

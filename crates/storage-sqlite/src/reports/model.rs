//! Database models for reports.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use log::error;

use kgiq_core::reports::{GeneratedReport, ReportType, ScheduledReport};
use kgiq_core::schedule::Frequency;

use crate::utils::parse_enum;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::scheduled_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScheduledReportDB {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub report_type: String,
    pub frequency: String,
    pub next_run_date: NaiveDate,
    pub last_run_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::generated_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GeneratedReportDB {
    pub id: String,
    pub family_id: String,
    pub scheduled_report_id: Option<String>,
    pub report_type: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data: String,
    pub created_at: NaiveDateTime,
}

impl From<ScheduledReportDB> for ScheduledReport {
    fn from(db: ScheduledReportDB) -> Self {
        Self {
            report_type: parse_enum(&db.report_type, "report_type", ReportType::CashFlow),
            frequency: parse_enum(&db.frequency, "frequency", Frequency::Monthly),
            id: db.id,
            family_id: db.family_id,
            name: db.name,
            next_run_date: db.next_run_date,
            last_run_at: db.last_run_at,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<GeneratedReportDB> for GeneratedReport {
    fn from(db: GeneratedReportDB) -> Self {
        let data = serde_json::from_str(&db.data).unwrap_or_else(|e| {
            error!("Report {} has unreadable data: {}", db.id, e);
            serde_json::Value::Null
        });
        Self {
            report_type: parse_enum(&db.report_type, "report_type", ReportType::CashFlow),
            id: db.id,
            family_id: db.family_id,
            scheduled_report_id: db.scheduled_report_id,
            period_start: db.period_start,
            period_end: db.period_end,
            data,
            created_at: db.created_at,
        }
    }
}

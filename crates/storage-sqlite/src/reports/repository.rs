use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::reports::{
    GeneratedReport, NewGeneratedReport, NewScheduledReport, ReportRepositoryTrait,
    ScheduledReport, ScheduledReportUpdate,
};
use kgiq_core::Result;

use super::model::{GeneratedReportDB, ScheduledReportDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::{generated_reports, scheduled_reports};

pub struct ReportRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReportRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_schedule(
    conn: &mut SqliteConnection,
    family: &str,
    schedule_id: &str,
) -> Result<ScheduledReportDB> {
    scheduled_reports::table
        .filter(scheduled_reports::id.eq(schedule_id))
        .filter(scheduled_reports::family_id.eq(family))
        .first::<ScheduledReportDB>(conn)
        .or_not_found("Scheduled report", schedule_id)
}

#[async_trait]
impl ReportRepositoryTrait for ReportRepository {
    fn list_reports(&self, family_id: &str, limit: i64) -> Result<Vec<GeneratedReport>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = generated_reports::table
            .filter(generated_reports::family_id.eq(family_id))
            .order(generated_reports::created_at.desc())
            .limit(limit)
            .load::<GeneratedReportDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(GeneratedReport::from).collect())
    }

    fn get_report(&self, family_id: &str, report_id: &str) -> Result<GeneratedReport> {
        let mut conn = get_connection(&self.pool)?;
        generated_reports::table
            .filter(generated_reports::id.eq(report_id))
            .filter(generated_reports::family_id.eq(family_id))
            .first::<GeneratedReportDB>(&mut conn)
            .or_not_found("Report", report_id)
            .map(GeneratedReport::from)
    }

    async fn create_report(
        &self,
        family_id: &str,
        report: NewGeneratedReport,
    ) -> Result<GeneratedReport> {
        let row = GeneratedReportDB {
            id: Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            scheduled_report_id: report.scheduled_report_id,
            report_type: report.report_type.as_str().to_string(),
            period_start: report.period_start,
            period_end: report.period_end,
            data: serde_json::to_string(&report.data)?,
            created_at: Utc::now().naive_utc(),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<GeneratedReport> {
                diesel::insert_into(generated_reports::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(GeneratedReport::from(row))
            })
            .await
    }

    async fn delete_report(&self, family_id: &str, report_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let report_id = report_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let deleted = diesel::delete(
                    generated_reports::table
                        .filter(generated_reports::id.eq(&report_id))
                        .filter(generated_reports::family_id.eq(&family_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if deleted == 0 {
                    return Err(kgiq_core::Error::not_found("Report", &report_id));
                }
                Ok(())
            })
            .await
    }

    fn list_schedules(&self, family_id: &str) -> Result<Vec<ScheduledReport>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scheduled_reports::table
            .filter(scheduled_reports::family_id.eq(family_id))
            .order((
                scheduled_reports::next_run_date.asc(),
                scheduled_reports::name.asc(),
            ))
            .load::<ScheduledReportDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(ScheduledReport::from).collect())
    }

    fn get_schedule(&self, family_id: &str, schedule_id: &str) -> Result<ScheduledReport> {
        let mut conn = get_connection(&self.pool)?;
        load_schedule(&mut conn, family_id, schedule_id).map(ScheduledReport::from)
    }

    async fn create_schedule(
        &self,
        family_id: &str,
        schedule: NewScheduledReport,
        next_run_date: NaiveDate,
    ) -> Result<ScheduledReport> {
        let now = Utc::now().naive_utc();
        let row = ScheduledReportDB {
            id: Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            name: schedule.name.trim().to_string(),
            report_type: schedule.report_type.as_str().to_string(),
            frequency: schedule.frequency.as_str().to_string(),
            next_run_date,
            last_run_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScheduledReport> {
                diesel::insert_into(scheduled_reports::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(ScheduledReport::from(row))
            })
            .await
    }

    async fn update_schedule(
        &self,
        family_id: &str,
        schedule_id: &str,
        update: ScheduledReportUpdate,
    ) -> Result<ScheduledReport> {
        let family_id = family_id.to_string();
        let schedule_id = schedule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScheduledReport> {
                let current = load_schedule(conn, &family_id, &schedule_id)?;
                diesel::update(scheduled_reports::table.find(&schedule_id))
                    .set((
                        scheduled_reports::name.eq(update
                            .name
                            .map(|n| n.trim().to_string())
                            .unwrap_or(current.name)),
                        scheduled_reports::report_type.eq(update
                            .report_type
                            .map(|t| t.as_str().to_string())
                            .unwrap_or(current.report_type)),
                        scheduled_reports::frequency.eq(update
                            .frequency
                            .map(|f| f.as_str().to_string())
                            .unwrap_or(current.frequency)),
                        scheduled_reports::next_run_date
                            .eq(update.next_run_date.unwrap_or(current.next_run_date)),
                        scheduled_reports::is_active
                            .eq(update.is_active.unwrap_or(current.is_active)),
                        scheduled_reports::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_schedule(conn, &family_id, &schedule_id).map(ScheduledReport::from)
            })
            .await
    }

    async fn delete_schedule(&self, family_id: &str, schedule_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let schedule_id = schedule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                load_schedule(conn, &family_id, &schedule_id)?;
                diesel::update(
                    generated_reports::table
                        .filter(generated_reports::scheduled_report_id.eq(&schedule_id)),
                )
                .set(generated_reports::scheduled_report_id.eq(None::<String>))
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::delete(scheduled_reports::table.find(&schedule_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_due_schedules(
        &self,
        family_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<ScheduledReport>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scheduled_reports::table
            .filter(scheduled_reports::family_id.eq(family_id))
            .filter(scheduled_reports::is_active.eq(true))
            .filter(scheduled_reports::next_run_date.le(today))
            .order(scheduled_reports::next_run_date.asc())
            .load::<ScheduledReportDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(ScheduledReport::from).collect())
    }

    async fn record_schedule_run(
        &self,
        schedule_id: &str,
        ran_at: NaiveDateTime,
        next_run_date: NaiveDate,
    ) -> Result<ScheduledReport> {
        let schedule_id = schedule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScheduledReport> {
                diesel::update(scheduled_reports::table.find(&schedule_id))
                    .set((
                        scheduled_reports::last_run_at.eq(Some(ran_at)),
                        scheduled_reports::next_run_date.eq(next_run_date),
                        scheduled_reports::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                scheduled_reports::table
                    .find(&schedule_id)
                    .first::<ScheduledReportDB>(conn)
                    .or_not_found("Scheduled report", &schedule_id)
                    .map(ScheduledReport::from)
            })
            .await
    }
}

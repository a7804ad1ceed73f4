use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::reports_model::{
    ExportFormat, GenerateReportRequest, GeneratedReport, NewGeneratedReport, NewScheduledReport,
    ReportExport, ScheduledReport, ScheduledReportUpdate,
};
use crate::errors::Result;

/// Persistence contract for generated and scheduled reports.
#[async_trait]
pub trait ReportRepositoryTrait: Send + Sync {
    /// Newest first.
    fn list_reports(&self, family_id: &str, limit: i64) -> Result<Vec<GeneratedReport>>;
    fn get_report(&self, family_id: &str, report_id: &str) -> Result<GeneratedReport>;
    async fn create_report(
        &self,
        family_id: &str,
        report: NewGeneratedReport,
    ) -> Result<GeneratedReport>;
    async fn delete_report(&self, family_id: &str, report_id: &str) -> Result<()>;

    fn list_schedules(&self, family_id: &str) -> Result<Vec<ScheduledReport>>;
    fn get_schedule(&self, family_id: &str, schedule_id: &str) -> Result<ScheduledReport>;
    /// `next_run_date` has already been resolved by the caller.
    async fn create_schedule(
        &self,
        family_id: &str,
        schedule: NewScheduledReport,
        next_run_date: NaiveDate,
    ) -> Result<ScheduledReport>;
    async fn update_schedule(
        &self,
        family_id: &str,
        schedule_id: &str,
        update: ScheduledReportUpdate,
    ) -> Result<ScheduledReport>;
    /// Generated reports keep their rows; their schedule link is cleared.
    async fn delete_schedule(&self, family_id: &str, schedule_id: &str) -> Result<()>;
    /// Active schedules of the family with `next_run_date <= today`.
    fn list_due_schedules(&self, family_id: &str, today: NaiveDate)
        -> Result<Vec<ScheduledReport>>;
    async fn record_schedule_run(
        &self,
        schedule_id: &str,
        ran_at: NaiveDateTime,
        next_run_date: NaiveDate,
    ) -> Result<ScheduledReport>;
}

#[async_trait]
pub trait ReportServiceTrait: Send + Sync {
    async fn generate_report(
        &self,
        family_id: &str,
        request: GenerateReportRequest,
    ) -> Result<GeneratedReport>;
    fn list_reports(&self, family_id: &str, limit: Option<i64>) -> Result<Vec<GeneratedReport>>;
    fn get_report(&self, family_id: &str, report_id: &str) -> Result<GeneratedReport>;
    async fn delete_report(&self, family_id: &str, report_id: &str) -> Result<()>;
    fn export_report(
        &self,
        family_id: &str,
        report_id: &str,
        format: ExportFormat,
    ) -> Result<ReportExport>;

    fn list_schedules(&self, family_id: &str) -> Result<Vec<ScheduledReport>>;
    fn get_schedule(&self, family_id: &str, schedule_id: &str) -> Result<ScheduledReport>;
    async fn create_schedule(
        &self,
        family_id: &str,
        schedule: NewScheduledReport,
        today: NaiveDate,
    ) -> Result<ScheduledReport>;
    async fn update_schedule(
        &self,
        family_id: &str,
        schedule_id: &str,
        update: ScheduledReportUpdate,
    ) -> Result<ScheduledReport>;
    async fn delete_schedule(&self, family_id: &str, schedule_id: &str) -> Result<()>;
    /// Generates the schedule's report for the period ending yesterday
    /// without moving `next_run_date`.
    async fn run_now(
        &self,
        family_id: &str,
        schedule_id: &str,
        today: NaiveDate,
    ) -> Result<GeneratedReport>;
    /// Scheduler entry point, called per family with its local date.
    /// Returns the number of reports generated.
    async fn run_due(&self, family_id: &str, today: NaiveDate) -> Result<usize>;
}

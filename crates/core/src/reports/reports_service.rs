use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use super::report_builders::{
    build_cash_flow, build_income_analysis, build_net_worth, build_payment_summary,
    build_spending_by_category,
};
use super::report_export::export_report;
use super::reports_model::{
    validate_period, ExportFormat, GenerateReportRequest, GeneratedReport, NewGeneratedReport,
    NewScheduledReport, ReportExport, ReportType, ScheduledReport, ScheduledReportUpdate,
};
use super::reports_traits::{ReportRepositoryTrait, ReportServiceTrait};
use crate::bank::{BankAccountRepositoryTrait, TransactionRepositoryTrait};
use crate::budget::{build_performance, BudgetRepositoryTrait};
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{Error, Result};
use crate::income::{IncomeFilter, IncomeRepositoryTrait};
use crate::payments::{PaymentFilter, PaymentRepositoryTrait};

/// First run date after `today` for a schedule created without one.
pub fn initial_run_date(schedule: &NewScheduledReport, today: NaiveDate) -> Result<NaiveDate> {
    match schedule.next_run_date {
        Some(date) if date < today => Err(Error::invalid_input(
            "nextRunDate cannot be in the past",
        )),
        Some(date) => Ok(date),
        None => schedule
            .frequency
            .next_after(today)
            .ok_or_else(|| Error::invalid_input("Cannot compute the next run date")),
    }
}

/// Moves `next_run_date` forward until it is after `today`, skipping missed
/// periods instead of replaying them.
pub fn advance_run_date(schedule: &ScheduledReport, today: NaiveDate) -> Option<NaiveDate> {
    let anchor = schedule.next_run_date;
    let mut steps = 1;
    loop {
        let next = schedule.frequency.advance(anchor, steps)?;
        if next > today {
            return Some(next);
        }
        steps += 1;
    }
}

pub struct ReportService {
    repository: Arc<dyn ReportRepositoryTrait>,
    income_repository: Arc<dyn IncomeRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn BankAccountRepositoryTrait>,
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
}

impl ReportService {
    pub fn new(
        repository: Arc<dyn ReportRepositoryTrait>,
        income_repository: Arc<dyn IncomeRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn BankAccountRepositoryTrait>,
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            income_repository,
            payment_repository,
            transaction_repository,
            account_repository,
            budget_repository,
        }
    }

    /// Builds the payload of one report type over `[start, end]`.
    pub fn build_payload(
        &self,
        family_id: &str,
        report_type: ReportType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<serde_json::Value> {
        match report_type {
            ReportType::CashFlow => {
                // Received and paid rows are bucketed by their actual dates,
                // which may fall outside the scheduled range.
                let incomes = self
                    .income_repository
                    .list(family_id, &IncomeFilter::default())?;
                let payments = self
                    .payment_repository
                    .list(family_id, &PaymentFilter::default())?;
                let transactions = self
                    .transaction_repository
                    .list_between(family_id, start, end)?;
                to_value(&build_cash_flow(
                    start,
                    end,
                    &incomes,
                    &payments,
                    &transactions,
                ))
            }
            ReportType::SpendingByCategory => {
                let categories = self.budget_repository.list_categories(family_id, true)?;
                let spent = self
                    .transaction_repository
                    .spending_by_category(family_id, start, end)?;
                to_value(&build_spending_by_category(&categories, &spent))
            }
            ReportType::BudgetPerformance => {
                let categories = self.budget_repository.list_categories(family_id, false)?;
                let allocations = self
                    .budget_repository
                    .list_allocations_between(family_id, start, end)?;
                let spent = self
                    .transaction_repository
                    .spending_by_category(family_id, start, end)?;
                to_value(&build_performance(
                    start,
                    end,
                    &categories,
                    &allocations,
                    &spent,
                ))
            }
            ReportType::IncomeAnalysis => {
                let incomes = self.income_repository.list(
                    family_id,
                    &IncomeFilter {
                        start_date: Some(start),
                        end_date: Some(end),
                        ..IncomeFilter::default()
                    },
                )?;
                to_value(&build_income_analysis(&incomes))
            }
            ReportType::PaymentSummary => {
                let payments = self.payment_repository.list(
                    family_id,
                    &PaymentFilter {
                        start_date: Some(start),
                        end_date: Some(end),
                        ..PaymentFilter::default()
                    },
                )?;
                to_value(&build_payment_summary(&payments))
            }
            ReportType::NetWorth => {
                let accounts = self.account_repository.list(family_id, false)?;
                to_value(&build_net_worth(&accounts))
            }
        }
    }

    async fn generate_and_store(
        &self,
        family_id: &str,
        scheduled_report_id: Option<String>,
        report_type: ReportType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GeneratedReport> {
        let data = self.build_payload(family_id, report_type, start, end)?;
        let report = self
            .repository
            .create_report(
                family_id,
                NewGeneratedReport {
                    scheduled_report_id,
                    report_type,
                    period_start: start,
                    period_end: end,
                    data,
                },
            )
            .await?;
        debug!(
            "Generated {} report {} for family {} ({} to {})",
            report_type, report.id, family_id, start, end
        );
        Ok(report)
    }

    fn schedule_period(
        schedule: &ScheduledReport,
        run_date: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate)> {
        schedule.frequency.period_before(run_date).ok_or_else(|| {
            Error::invalid_input(format!(
                "Cannot compute a report period for schedule {}",
                schedule.id
            ))
        })
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(payload)?)
}

#[async_trait]
impl ReportServiceTrait for ReportService {
    async fn generate_report(
        &self,
        family_id: &str,
        request: GenerateReportRequest,
    ) -> Result<GeneratedReport> {
        request.validate()?;
        self.generate_and_store(
            family_id,
            None,
            request.report_type,
            request.start_date,
            request.end_date,
        )
        .await
    }

    fn list_reports(&self, family_id: &str, limit: Option<i64>) -> Result<Vec<GeneratedReport>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.repository.list_reports(family_id, limit)
    }

    fn get_report(&self, family_id: &str, report_id: &str) -> Result<GeneratedReport> {
        self.repository.get_report(family_id, report_id)
    }

    async fn delete_report(&self, family_id: &str, report_id: &str) -> Result<()> {
        self.repository.delete_report(family_id, report_id).await
    }

    fn export_report(
        &self,
        family_id: &str,
        report_id: &str,
        format: ExportFormat,
    ) -> Result<ReportExport> {
        let report = self.repository.get_report(family_id, report_id)?;
        export_report(&report, format)
    }

    fn list_schedules(&self, family_id: &str) -> Result<Vec<ScheduledReport>> {
        self.repository.list_schedules(family_id)
    }

    fn get_schedule(&self, family_id: &str, schedule_id: &str) -> Result<ScheduledReport> {
        self.repository.get_schedule(family_id, schedule_id)
    }

    async fn create_schedule(
        &self,
        family_id: &str,
        schedule: NewScheduledReport,
        today: NaiveDate,
    ) -> Result<ScheduledReport> {
        schedule.validate()?;
        let next_run_date = initial_run_date(&schedule, today)?;
        let created = self
            .repository
            .create_schedule(family_id, schedule, next_run_date)
            .await?;
        info!(
            "Scheduled {} report {} for family {}, first run {}",
            created.report_type, created.id, family_id, created.next_run_date
        );
        Ok(created)
    }

    async fn update_schedule(
        &self,
        family_id: &str,
        schedule_id: &str,
        update: ScheduledReportUpdate,
    ) -> Result<ScheduledReport> {
        update.validate()?;
        self.repository
            .update_schedule(family_id, schedule_id, update)
            .await
    }

    async fn delete_schedule(&self, family_id: &str, schedule_id: &str) -> Result<()> {
        self.repository.delete_schedule(family_id, schedule_id).await
    }

    async fn run_now(
        &self,
        family_id: &str,
        schedule_id: &str,
        today: NaiveDate,
    ) -> Result<GeneratedReport> {
        let schedule = self.repository.get_schedule(family_id, schedule_id)?;
        let (start, end) = Self::schedule_period(&schedule, today)?;
        let report = self
            .generate_and_store(
                family_id,
                Some(schedule.id.clone()),
                schedule.report_type,
                start,
                end,
            )
            .await?;
        self.repository
            .record_schedule_run(&schedule.id, Utc::now().naive_utc(), schedule.next_run_date)
            .await?;
        Ok(report)
    }

    async fn run_due(&self, family_id: &str, today: NaiveDate) -> Result<usize> {
        let due = self.repository.list_due_schedules(family_id, today)?;
        let mut generated = 0;
        for schedule in due {
            let outcome = async {
                let (start, end) = Self::schedule_period(&schedule, today)?;
                self.generate_and_store(
                    &schedule.family_id,
                    Some(schedule.id.clone()),
                    schedule.report_type,
                    start,
                    end,
                )
                .await?;
                let next = advance_run_date(&schedule, today).ok_or_else(|| {
                    Error::invalid_input(format!(
                        "Cannot advance schedule {} past {}",
                        schedule.id, today
                    ))
                })?;
                self.repository
                    .record_schedule_run(&schedule.id, Utc::now().naive_utc(), next)
                    .await
            }
            .await;

            match outcome {
                Ok(updated) => {
                    generated += 1;
                    debug!(
                        "Schedule {} ran, next run {}",
                        updated.id, updated.next_run_date
                    );
                }
                Err(e) => warn!("Scheduled report {} failed: {}", schedule.id, e),
            }
        }
        if generated > 0 {
            info!(
                "Generated {} scheduled reports for family {}",
                generated, family_id
            );
        }
        Ok(generated)
    }
}

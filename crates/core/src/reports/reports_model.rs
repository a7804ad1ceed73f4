//! Report definitions, stored reports and report payloads.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bank::AccountType;
use crate::errors::{Error, Result};
use crate::income::IncomeStatus;
use crate::payments::PaymentStatus;
use crate::schedule::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    CashFlow,
    SpendingByCategory,
    BudgetPerformance,
    IncomeAnalysis,
    PaymentSummary,
    NetWorth,
}

string_enum!(ReportType, "report type", {
    CashFlow => "CASH_FLOW",
    SpendingByCategory => "SPENDING_BY_CATEGORY",
    BudgetPerformance => "BUDGET_PERFORMANCE",
    IncomeAnalysis => "INCOME_ANALYSIS",
    PaymentSummary => "PAYMENT_SUMMARY",
    NetWorth => "NET_WORTH",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// A report snapshot with its JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub id: String,
    pub family_id: String,
    pub scheduled_report_id: Option<String>,
    pub report_type: ReportType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data: serde_json::Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGeneratedReport {
    pub scheduled_report_id: Option<String>,
    pub report_type: ReportType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl GenerateReportRequest {
    pub fn validate(&self) -> Result<()> {
        validate_period(self.start_date, self.end_date)
    }
}

pub fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::invalid_input("startDate must not be after endDate"));
    }
    if (end - start).num_days() > 366 * 5 {
        return Err(Error::invalid_input("Report periods are limited to five years"));
    }
    Ok(())
}

/// A report generated periodically by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReport {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub report_type: ReportType,
    pub frequency: Frequency,
    pub next_run_date: NaiveDate,
    pub last_run_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduledReport {
    pub name: String,
    pub report_type: ReportType,
    pub frequency: Frequency,
    /// Defaults to the next period boundary after today.
    pub next_run_date: Option<NaiveDate>,
}

impl NewScheduledReport {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Report name cannot be empty"));
        }
        self.frequency.validate_for_report()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReportUpdate {
    pub name: Option<String>,
    pub report_type: Option<ReportType>,
    pub frequency: Option<Frequency>,
    pub next_run_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl ScheduledReportUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::invalid_input("Report name cannot be empty"));
            }
        }
        if let Some(frequency) = &self.frequency {
            frequency.validate_for_report()?;
        }
        Ok(())
    }
}

/// A rendered export ready to be sent as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportExport {
    pub content_type: &'static str,
    pub filename: String,
    pub body: String,
}

// ----------------------------------------------------------------------------
// Payloads
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowMonth {
    pub month: NaiveDate,
    pub income_received: Decimal,
    pub payments_paid: Decimal,
    pub inflow: Decimal,
    pub outflow: Decimal,
    /// `inflow - outflow` of account transactions.
    pub net_cash_flow: Decimal,
    /// `income_received - payments_paid` of tracked events.
    pub net_scheduled: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub months: Vec<CashFlowMonth>,
    pub total_income_received: Decimal,
    pub total_payments_paid: Decimal,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub net_cash_flow: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub budget_category_id: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub share: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpendingByCategoryReport {
    pub total_spent: Decimal,
    pub categories: Vec<CategorySpending>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceTotal {
    pub source: String,
    pub count: usize,
    pub expected: Decimal,
    pub received: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatusTotal {
    pub status: IncomeStatus,
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeAnalysisReport {
    pub expected_total: Decimal,
    pub received_total: Decimal,
    /// Received minus scheduled amount over received events.
    pub variance: Decimal,
    pub by_source: Vec<SourceTotal>,
    pub by_status: Vec<IncomeStatusTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusTotal {
    pub status: PaymentStatus,
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayeeTotal {
    pub payee: String,
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummaryReport {
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub overdue_count: usize,
    pub overdue_amount: Decimal,
    pub by_status: Vec<PaymentStatusTotal>,
    pub by_payee: Vec<PayeeTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalanceLine {
    pub bank_account_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub is_liability: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthReport {
    pub assets: Decimal,
    pub liabilities: Decimal,
    pub net_worth: Decimal,
    pub accounts: Vec<AccountBalanceLine>,
}

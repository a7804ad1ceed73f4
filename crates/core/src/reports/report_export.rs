//! JSON and CSV rendering of generated reports.

use csv::Writer;
use serde::de::DeserializeOwned;

use super::reports_model::{
    CashFlowReport, ExportFormat, GeneratedReport, IncomeAnalysisReport, NetWorthReport,
    PaymentSummaryReport, ReportExport, ReportType, SpendingByCategoryReport,
};
use crate::budget::BudgetPerformance;
use crate::errors::{Error, Result};

pub fn export_report(report: &GeneratedReport, format: ExportFormat) -> Result<ReportExport> {
    let stem = format!(
        "{}_{}_{}",
        report.report_type.as_str().to_lowercase(),
        report.period_start,
        report.period_end
    );
    match format {
        ExportFormat::Json => Ok(ReportExport {
            content_type: "application/json",
            filename: format!("{}.json", stem),
            body: serde_json::to_string_pretty(report)
                .map_err(|e| Error::Export(e.to_string()))?,
        }),
        ExportFormat::Csv => Ok(ReportExport {
            content_type: "text/csv",
            filename: format!("{}.csv", stem),
            body: render_csv(report)?,
        }),
    }
}

fn payload<T: DeserializeOwned>(report: &GeneratedReport) -> Result<T> {
    serde_json::from_value(report.data.clone()).map_err(|e| {
        Error::Export(format!(
            "Stored {} payload of report {} is malformed: {}",
            report.report_type, report.id, e
        ))
    })
}

/// One header row followed by the report's detail rows.
pub fn render_csv(report: &GeneratedReport) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());

    match report.report_type {
        ReportType::CashFlow => {
            let data: CashFlowReport = payload(report)?;
            writer.write_record([
                "month",
                "income_received",
                "payments_paid",
                "inflow",
                "outflow",
                "net_cash_flow",
                "net_scheduled",
            ])?;
            for m in &data.months {
                writer.write_record([
                    m.month.format("%Y-%m").to_string(),
                    m.income_received.to_string(),
                    m.payments_paid.to_string(),
                    m.inflow.to_string(),
                    m.outflow.to_string(),
                    m.net_cash_flow.to_string(),
                    m.net_scheduled.to_string(),
                ])?;
            }
        }
        ReportType::SpendingByCategory => {
            let data: SpendingByCategoryReport = payload(report)?;
            writer.write_record(["budget_category_id", "name", "amount", "share"])?;
            for row in &data.categories {
                writer.write_record([
                    row.budget_category_id.clone().unwrap_or_default(),
                    row.name.clone(),
                    row.amount.to_string(),
                    row.share.to_string(),
                ])?;
            }
        }
        ReportType::BudgetPerformance => {
            let data: BudgetPerformance = payload(report)?;
            writer.write_record([
                "budget_category_id",
                "name",
                "target_percentage",
                "allocated",
                "spent",
                "remaining",
                "percent_used",
            ])?;
            for row in &data.categories {
                writer.write_record([
                    row.budget_category_id.clone(),
                    row.name.clone(),
                    row.target_percentage.to_string(),
                    row.allocated.to_string(),
                    row.spent.to_string(),
                    row.remaining.to_string(),
                    row.percent_used.to_string(),
                ])?;
            }
        }
        ReportType::IncomeAnalysis => {
            let data: IncomeAnalysisReport = payload(report)?;
            writer.write_record(["source", "count", "expected", "received"])?;
            for row in &data.by_source {
                writer.write_record([
                    row.source.clone(),
                    row.count.to_string(),
                    row.expected.to_string(),
                    row.received.to_string(),
                ])?;
            }
        }
        ReportType::PaymentSummary => {
            let data: PaymentSummaryReport = payload(report)?;
            writer.write_record(["payee", "count", "amount"])?;
            for row in &data.by_payee {
                writer.write_record([
                    row.payee.clone(),
                    row.count.to_string(),
                    row.amount.to_string(),
                ])?;
            }
        }
        ReportType::NetWorth => {
            let data: NetWorthReport = payload(report)?;
            writer.write_record(["bank_account_id", "name", "account_type", "balance"])?;
            for row in &data.accounts {
                writer.write_record([
                    row.bank_account_id.clone(),
                    row.name.clone(),
                    row.account_type.to_string(),
                    row.balance.to_string(),
                ])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
}

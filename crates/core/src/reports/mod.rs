//! Generated and scheduled financial reports.

mod report_builders;
mod report_export;
mod reports_model;
mod reports_service;
mod reports_traits;

#[cfg(test)]
mod report_builders_tests;

pub use report_builders::{
    build_cash_flow, build_income_analysis, build_net_worth, build_payment_summary,
    build_spending_by_category,
};
pub use report_export::{export_report, render_csv};
pub use reports_model::*;
pub use reports_service::{advance_run_date, initial_run_date, ReportService};
pub use reports_traits::{ReportRepositoryTrait, ReportServiceTrait};

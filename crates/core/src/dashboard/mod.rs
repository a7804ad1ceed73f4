//! Household overview combining accounts, cash flow and budget state.

mod dashboard_model;
mod dashboard_service;

#[cfg(test)]
mod dashboard_tests;

pub use dashboard_model::DashboardSummary;
pub use dashboard_service::{build_summary, DashboardInputs, DashboardService, DashboardServiceTrait};

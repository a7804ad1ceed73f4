//! SQLite storage implementation for generated and scheduled reports.

mod model;
mod repository;

pub use model::{GeneratedReportDB, ScheduledReportDB};
pub use repository::ReportRepository;

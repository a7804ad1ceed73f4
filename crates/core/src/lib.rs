//! KGiQ Core - Domain entities, services, and traits.
//!
//! This crate contains the household budgeting business logic. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` and `connect` crates.

#[macro_use]
mod macros;

pub mod attribution;
pub mod bank;
pub mod budget;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod families;
pub mod income;
pub mod payments;
pub mod reports;
pub mod schedule;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

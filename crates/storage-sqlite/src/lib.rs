//! SQLite storage implementation for KGiQ Family Finance.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `kgiq-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The domain crate and the server work with the repository traits only.
//!
//! ```text
//! core (domain)          server (HTTP)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

// Repository implementations
pub mod attribution;
pub mod bank;
pub mod budget;
pub mod families;
pub mod income;
pub mod payments;
pub mod reports;

#[cfg(test)]
mod test_support;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repositories
pub use attribution::AttributionRepository;
pub use bank::{BankAccountRepository, BankConnectionRepository, TransactionRepository};
pub use budget::BudgetRepository;
pub use families::FamilyRepository;
pub use income::IncomeRepository;
pub use payments::PaymentRepository;
pub use reports::ReportRepository;

// Re-export from kgiq-core for convenience
pub use kgiq_core::errors::{DatabaseError, Error, Result};

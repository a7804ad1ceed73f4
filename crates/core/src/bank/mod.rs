//! Bank accounts, transactions and provider sync.

mod accounts_model;
mod accounts_service;
mod bank_traits;
mod connections_model;
mod sync_service;
mod transactions_model;
mod transactions_service;

#[cfg(test)]
mod bank_service_tests;
#[cfg(test)]
mod sync_service_tests;

pub use accounts_model::*;
pub use accounts_service::BankAccountService;
pub use bank_traits::*;
pub use connections_model::*;
pub use sync_service::SyncService;
pub use transactions_model::*;
pub use transactions_service::TransactionService;

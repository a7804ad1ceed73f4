//! SQLite storage implementation for bank accounts, transactions and
//! provider connections.

mod accounts_repository;
mod connections_repository;
mod model;
mod transactions_repository;

pub use accounts_repository::BankAccountRepository;
pub use connections_repository::BankConnectionRepository;
pub use model::{BankAccountDB, BankConnectionDB, TransactionDB};
pub use transactions_repository::TransactionRepository;

//! Repository, provider and service contracts for bank data.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::accounts_model::{BankAccount, BankAccountUpdate, NewBankAccount};
use super::connections_model::{
    BankConnection, ConnectionSecret, LinkToken, NewBankConnection, ProviderAccount, SyncBatch,
    SyncSummary, TokenExchange, TransactionSyncPage,
};
use super::transactions_model::{
    NewTransaction, Transaction, TransactionFilter, TransactionPage, TransactionUpdate,
};
use crate::errors::Result;

#[async_trait]
pub trait BankAccountRepositoryTrait: Send + Sync {
    fn list(&self, family_id: &str, include_inactive: bool) -> Result<Vec<BankAccount>>;

    fn get(&self, family_id: &str, account_id: &str) -> Result<BankAccount>;

    async fn create(
        &self,
        family_id: &str,
        currency: &str,
        account: NewBankAccount,
    ) -> Result<BankAccount>;

    async fn update(
        &self,
        family_id: &str,
        account_id: &str,
        update: BankAccountUpdate,
    ) -> Result<BankAccount>;

    /// Deletes the account and its transactions.
    async fn delete(&self, family_id: &str, account_id: &str) -> Result<()>;
}

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn list(&self, family_id: &str, filter: &TransactionFilter) -> Result<TransactionPage>;

    fn get(&self, family_id: &str, transaction_id: &str) -> Result<Transaction>;

    async fn create(&self, family_id: &str, transaction: NewTransaction) -> Result<Transaction>;

    async fn update(
        &self,
        family_id: &str,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction>;

    /// Runs `check_transaction_delete` inside the write transaction.
    async fn delete(&self, family_id: &str, transaction_id: &str) -> Result<()>;

    /// Sets the category of every listed transaction of the family; returns
    /// how many rows changed.
    async fn bulk_categorize(
        &self,
        family_id: &str,
        transaction_ids: Vec<String>,
        budget_category_id: Option<String>,
    ) -> Result<usize>;

    /// Outflow totals in the range keyed by category (`None` = uncategorized).
    fn spending_by_category(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HashMap<Option<String>, Decimal>>;

    fn list_between(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait BankConnectionRepositoryTrait: Send + Sync {
    /// Stores a new connection together with its accounts.
    async fn create_connection(
        &self,
        family_id: &str,
        connection: NewBankConnection,
        accounts: Vec<ProviderAccount>,
    ) -> Result<(BankConnection, Vec<BankAccount>)>;

    fn list_connections(&self, family_id: &str) -> Result<Vec<BankConnection>>;

    fn get_connection(&self, family_id: &str, connection_id: &str) -> Result<BankConnection>;

    /// Connections of every family that are not disconnected.
    fn list_syncable_connections(&self) -> Result<Vec<BankConnection>>;

    fn get_secret(&self, connection_id: &str) -> Result<ConnectionSecret>;

    /// Upserts accounts and transactions, deletes removed ones, stores the
    /// cursor and marks the connection ACTIVE.
    async fn apply_sync(&self, connection_id: &str, batch: SyncBatch) -> Result<SyncSummary>;

    async fn record_sync_error(&self, connection_id: &str, message: String) -> Result<()>;

    /// Marks the connection DISCONNECTED and its accounts inactive.
    async fn mark_disconnected(
        &self,
        family_id: &str,
        connection_id: &str,
    ) -> Result<BankConnection>;
}

/// Hosted bank aggregation API.
#[async_trait]
pub trait BankDataProvider: Send + Sync {
    async fn create_link_token(&self, client_user_id: &str) -> Result<LinkToken>;

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange>;

    async fn get_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>>;

    async fn sync_transactions(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionSyncPage>;

    async fn remove_item(&self, access_token: &str) -> Result<()>;
}

/// Symmetric encryption of provider access tokens at rest.
pub trait TokenCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

#[async_trait]
pub trait BankAccountServiceTrait: Send + Sync {
    fn list_accounts(&self, family_id: &str, include_inactive: bool) -> Result<Vec<BankAccount>>;

    fn get_account(&self, family_id: &str, account_id: &str) -> Result<BankAccount>;

    async fn create_account(
        &self,
        family_id: &str,
        family_currency: &str,
        account: NewBankAccount,
    ) -> Result<BankAccount>;

    async fn update_account(
        &self,
        family_id: &str,
        account_id: &str,
        update: BankAccountUpdate,
    ) -> Result<BankAccount>;

    async fn delete_account(&self, family_id: &str, account_id: &str) -> Result<()>;
}

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    fn list_transactions(&self, family_id: &str, filter: TransactionFilter)
        -> Result<TransactionPage>;

    fn get_transaction(&self, family_id: &str, transaction_id: &str) -> Result<Transaction>;

    async fn create_transaction(
        &self,
        family_id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction>;

    async fn update_transaction(
        &self,
        family_id: &str,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction>;

    async fn delete_transaction(&self, family_id: &str, transaction_id: &str) -> Result<()>;

    async fn bulk_categorize(
        &self,
        family_id: &str,
        transaction_ids: Vec<String>,
        budget_category_id: Option<String>,
    ) -> Result<usize>;
}

#[async_trait]
pub trait SyncServiceTrait: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn create_link_token(&self, member_id: &str) -> Result<LinkToken>;

    async fn link(
        &self,
        family_id: &str,
        public_token: &str,
        institution_name: Option<String>,
    ) -> Result<(BankConnection, Vec<BankAccount>)>;

    fn list_connections(&self, family_id: &str) -> Result<Vec<BankConnection>>;

    async fn sync_connection(&self, family_id: &str, connection_id: &str)
        -> Result<SyncSummary>;

    /// Syncs every connection of the family; failures are recorded on the
    /// connection and skipped.
    async fn sync_family(&self, family_id: &str) -> Result<Vec<SyncSummary>>;

    /// Scheduler entry point. Returns the number of connections synced.
    async fn sync_all(&self) -> Result<usize>;

    async fn disconnect(&self, family_id: &str, connection_id: &str) -> Result<BankConnection>;
}

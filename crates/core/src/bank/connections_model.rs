//! Linked provider items and the data exchanged with the bank data provider.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::accounts_model::AccountType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    #[default]
    Active,
    Error,
    Disconnected,
}

string_enum!(ConnectionStatus, "connection status", {
    Active => "ACTIVE",
    Error => "ERROR",
    Disconnected => "DISCONNECTED",
});

/// One linked institution login at the provider.
///
/// The access token never leaves storage unencrypted and is not part of
/// this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankConnection {
    pub id: String,
    pub family_id: String,
    pub institution_name: String,
    pub provider_item_id: String,
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    pub last_synced_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBankConnection {
    pub institution_name: String,
    pub provider_item_id: String,
    pub encrypted_access_token: String,
}

/// Stored credentials of a connection.
#[derive(Debug, Clone)]
pub struct ConnectionSecret {
    pub connection_id: String,
    pub encrypted_access_token: String,
    pub sync_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkToken {
    pub link_token: String,
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenExchange {
    pub access_token: String,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAccount {
    pub provider_account_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub mask: Option<String>,
    pub current_balance: Decimal,
    pub available_balance: Option<Decimal>,
    pub currency: Option<String>,
}

/// A transaction as reported by the provider (positive = outflow).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTransaction {
    pub provider_transaction_id: String,
    pub provider_account_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub merchant_name: Option<String>,
    pub description: String,
    pub pending: bool,
}

/// One page of the provider's incremental transaction feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSyncPage {
    pub added: Vec<ProviderTransaction>,
    pub modified: Vec<ProviderTransaction>,
    pub removed: Vec<String>,
    pub next_cursor: String,
    pub has_more: bool,
}

/// Everything collected during one sync, applied in a single transaction.
#[derive(Debug, Clone, Default)]
pub struct SyncBatch {
    pub accounts: Vec<ProviderAccount>,
    pub added: Vec<ProviderTransaction>,
    pub modified: Vec<ProviderTransaction>,
    pub removed: Vec<String>,
    pub next_cursor: Option<String>,
}

impl SyncBatch {
    pub fn absorb(&mut self, page: TransactionSyncPage) {
        self.added.extend(page.added);
        self.modified.extend(page.modified);
        self.removed.extend(page.removed);
        self.next_cursor = Some(page.next_cursor);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub connection_id: String,
    pub accounts_updated: usize,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub public_token: String,
    pub institution_name: Option<String>,
}

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::bank::{
    BankAccount, BankConnection, BankConnectionRepositoryTrait, ConnectionSecret,
    ConnectionStatus, NewBankConnection, ProviderAccount, ProviderTransaction, SyncBatch,
    SyncSummary,
};
use kgiq_core::Result;

use super::model::{BankAccountDB, BankConnectionDB, TransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{unique_as_conflict, OptionalRow, StorageError};
use crate::schema::{bank_accounts, bank_connections, families, transactions};
use crate::utils::chunk_for_sqlite;

pub struct BankConnectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BankConnectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_connection(conn: &mut SqliteConnection, connection_id: &str) -> Result<BankConnectionDB> {
    bank_connections::table
        .find(connection_id)
        .first::<BankConnectionDB>(conn)
        .or_not_found("Bank connection", connection_id)
}

fn family_currency(conn: &mut SqliteConnection, family: &str) -> Result<String> {
    families::table
        .find(family)
        .select(families::currency)
        .first::<String>(conn)
        .or_not_found("Family", family)
}

/// Inserts or refreshes the provider accounts of a connection and returns
/// the provider account id to local account id mapping.
fn upsert_accounts(
    conn: &mut SqliteConnection,
    connection: &BankConnectionDB,
    accounts: Vec<ProviderAccount>,
) -> Result<HashMap<String, String>> {
    let currency = family_currency(conn, &connection.family_id)?;
    let now = Utc::now().naive_utc();
    for account in accounts {
        let existing = bank_accounts::table
            .filter(bank_accounts::connection_id.eq(&connection.id))
            .filter(bank_accounts::provider_account_id.eq(&account.provider_account_id))
            .select(bank_accounts::id)
            .first::<String>(conn)
            .optional()
            .map_err(StorageError::from)?;

        match existing {
            Some(account_id) => {
                diesel::update(bank_accounts::table.find(&account_id))
                    .set((
                        bank_accounts::name.eq(&account.name),
                        bank_accounts::account_type.eq(account.account_type.as_str()),
                        bank_accounts::mask.eq(&account.mask),
                        bank_accounts::current_balance.eq(account.current_balance.to_string()),
                        bank_accounts::available_balance
                            .eq(account.available_balance.map(|b| b.to_string())),
                        bank_accounts::is_active.eq(true),
                        bank_accounts::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
            }
            None => {
                let row = BankAccountDB {
                    id: Uuid::new_v4().to_string(),
                    family_id: connection.family_id.clone(),
                    connection_id: Some(connection.id.clone()),
                    provider_account_id: Some(account.provider_account_id),
                    name: account.name,
                    institution_name: Some(connection.institution_name.clone()),
                    account_type: account.account_type.as_str().to_string(),
                    mask: account.mask,
                    current_balance: account.current_balance.to_string(),
                    available_balance: account.available_balance.map(|b| b.to_string()),
                    currency: account.currency.unwrap_or_else(|| currency.clone()),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(bank_accounts::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
            }
        }
    }

    let mapping = bank_accounts::table
        .filter(bank_accounts::connection_id.eq(&connection.id))
        .select((bank_accounts::provider_account_id, bank_accounts::id))
        .load::<(Option<String>, String)>(conn)
        .map_err(StorageError::from)?
        .into_iter()
        .filter_map(|(provider_id, id)| provider_id.map(|p| (p, id)))
        .collect();
    Ok(mapping)
}

/// Writes one provider transaction. Category and notes set locally survive
/// provider modifications. Returns false when the account is unknown.
fn upsert_transaction(
    conn: &mut SqliteConnection,
    family: &str,
    account_ids: &HashMap<String, String>,
    txn: ProviderTransaction,
) -> Result<bool> {
    let Some(account_id) = account_ids.get(&txn.provider_account_id) else {
        warn!(
            "Skipping transaction {} for unknown account {}",
            txn.provider_transaction_id, txn.provider_account_id
        );
        return Ok(false);
    };
    let now = Utc::now().naive_utc();
    let existing = transactions::table
        .filter(transactions::provider_transaction_id.eq(&txn.provider_transaction_id))
        .select(transactions::id)
        .first::<String>(conn)
        .optional()
        .map_err(StorageError::from)?;

    match existing {
        Some(id) => {
            diesel::update(transactions::table.find(&id))
                .set((
                    transactions::bank_account_id.eq(account_id),
                    transactions::amount.eq(txn.amount.to_string()),
                    transactions::transaction_date.eq(txn.date),
                    transactions::merchant_name.eq(&txn.merchant_name),
                    transactions::description.eq(&txn.description),
                    transactions::pending.eq(txn.pending),
                    transactions::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
        }
        None => {
            let row = TransactionDB {
                id: Uuid::new_v4().to_string(),
                family_id: family.to_string(),
                bank_account_id: account_id.clone(),
                provider_transaction_id: Some(txn.provider_transaction_id),
                amount: txn.amount.to_string(),
                transaction_date: txn.date,
                merchant_name: txn.merchant_name,
                description: txn.description,
                budget_category_id: None,
                pending: txn.pending,
                notes: None,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(transactions::table)
                .values(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
    }
    Ok(true)
}

#[async_trait]
impl BankConnectionRepositoryTrait for BankConnectionRepository {
    async fn create_connection(
        &self,
        family_id: &str,
        connection: NewBankConnection,
        accounts: Vec<ProviderAccount>,
    ) -> Result<(BankConnection, Vec<BankAccount>)> {
        let family_id = family_id.to_string();
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<(BankConnection, Vec<BankAccount>)> {
                    let now = Utc::now().naive_utc();
                    let row = BankConnectionDB {
                        id: Uuid::new_v4().to_string(),
                        family_id,
                        institution_name: connection.institution_name,
                        provider_item_id: connection.provider_item_id,
                        encrypted_access_token: connection.encrypted_access_token,
                        sync_cursor: None,
                        status: ConnectionStatus::Active.as_str().to_string(),
                        last_error: None,
                        last_synced_at: None,
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(bank_connections::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(|e| {
                            unique_as_conflict(e, "This institution login is already linked")
                        })?;

                    upsert_accounts(conn, &row, accounts)?;
                    let linked = bank_accounts::table
                        .filter(bank_accounts::connection_id.eq(&row.id))
                        .order(bank_accounts::name.asc())
                        .load::<BankAccountDB>(conn)
                        .map_err(StorageError::from)?;
                    Ok((
                        BankConnection::from(row),
                        linked.into_iter().map(BankAccount::from).collect(),
                    ))
                },
            )
            .await
    }

    fn list_connections(&self, family_id: &str) -> Result<Vec<BankConnection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = bank_connections::table
            .filter(bank_connections::family_id.eq(family_id))
            .order(bank_connections::created_at.asc())
            .load::<BankConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BankConnection::from).collect())
    }

    fn get_connection(&self, family_id: &str, connection_id: &str) -> Result<BankConnection> {
        let mut conn = get_connection(&self.pool)?;
        bank_connections::table
            .filter(bank_connections::id.eq(connection_id))
            .filter(bank_connections::family_id.eq(family_id))
            .first::<BankConnectionDB>(&mut conn)
            .or_not_found("Bank connection", connection_id)
            .map(BankConnection::from)
    }

    fn list_syncable_connections(&self) -> Result<Vec<BankConnection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = bank_connections::table
            .filter(bank_connections::status.ne(ConnectionStatus::Disconnected.as_str()))
            .order(bank_connections::created_at.asc())
            .load::<BankConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BankConnection::from).collect())
    }

    fn get_secret(&self, connection_id: &str) -> Result<ConnectionSecret> {
        let mut conn = get_connection(&self.pool)?;
        load_connection(&mut conn, connection_id).map(ConnectionSecret::from)
    }

    async fn apply_sync(&self, connection_id: &str, batch: SyncBatch) -> Result<SyncSummary> {
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SyncSummary> {
                let connection = load_connection(conn, &connection_id)?;
                let mut summary = SyncSummary {
                    connection_id: connection_id.clone(),
                    accounts_updated: batch.accounts.len(),
                    ..SyncSummary::default()
                };

                let account_ids = upsert_accounts(conn, &connection, batch.accounts)?;
                for txn in batch.added {
                    if upsert_transaction(conn, &connection.family_id, &account_ids, txn)? {
                        summary.added += 1;
                    }
                }
                for txn in batch.modified {
                    if upsert_transaction(conn, &connection.family_id, &account_ids, txn)? {
                        summary.modified += 1;
                    }
                }
                for chunk in chunk_for_sqlite(&batch.removed) {
                    summary.removed += diesel::delete(
                        transactions::table
                            .filter(transactions::family_id.eq(&connection.family_id))
                            .filter(transactions::provider_transaction_id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }

                let now = Utc::now().naive_utc();
                diesel::update(bank_connections::table.find(&connection_id))
                    .set((
                        bank_connections::sync_cursor
                            .eq(batch.next_cursor.or(connection.sync_cursor)),
                        bank_connections::status.eq(ConnectionStatus::Active.as_str()),
                        bank_connections::last_error.eq(None::<String>),
                        bank_connections::last_synced_at.eq(Some(now)),
                        bank_connections::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                debug!(
                    "Applied sync for connection {}: {} added, {} modified, {} removed",
                    connection_id, summary.added, summary.modified, summary.removed
                );
                Ok(summary)
            })
            .await
    }

    async fn record_sync_error(&self, connection_id: &str, message: String) -> Result<()> {
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(bank_connections::table.find(&connection_id))
                    .set((
                        bank_connections::status.eq(ConnectionStatus::Error.as_str()),
                        bank_connections::last_error.eq(Some(message)),
                        bank_connections::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_disconnected(
        &self,
        family_id: &str,
        connection_id: &str,
    ) -> Result<BankConnection> {
        let family_id = family_id.to_string();
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BankConnection> {
                let current = load_connection(conn, &connection_id)?;
                if current.family_id != family_id {
                    return Err(kgiq_core::Error::not_found("Bank connection", &connection_id));
                }
                let now = Utc::now().naive_utc();
                diesel::update(bank_connections::table.find(&connection_id))
                    .set((
                        bank_connections::status.eq(ConnectionStatus::Disconnected.as_str()),
                        bank_connections::sync_cursor.eq(None::<String>),
                        bank_connections::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::update(
                    bank_accounts::table.filter(bank_accounts::connection_id.eq(&connection_id)),
                )
                .set((
                    bank_accounts::is_active.eq(false),
                    bank_accounts::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                load_connection(conn, &connection_id).map(BankConnection::from)
            })
            .await
    }
}

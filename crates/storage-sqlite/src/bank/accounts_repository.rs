use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::bank::{BankAccount, BankAccountRepositoryTrait, BankAccountUpdate, NewBankAccount};
use kgiq_core::Result;

use super::model::BankAccountDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::{bank_accounts, transactions};

pub struct BankAccountRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BankAccountRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

pub(super) fn load_account(
    conn: &mut SqliteConnection,
    family: &str,
    account_id: &str,
) -> Result<BankAccountDB> {
    bank_accounts::table
        .filter(bank_accounts::id.eq(account_id))
        .filter(bank_accounts::family_id.eq(family))
        .first::<BankAccountDB>(conn)
        .or_not_found("Bank account", account_id)
}

#[async_trait]
impl BankAccountRepositoryTrait for BankAccountRepository {
    fn list(&self, family_id: &str, include_inactive: bool) -> Result<Vec<BankAccount>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = bank_accounts::table
            .filter(bank_accounts::family_id.eq(family_id))
            .into_boxed();
        if !include_inactive {
            query = query.filter(bank_accounts::is_active.eq(true));
        }
        let rows = query
            .order((bank_accounts::name.asc(), bank_accounts::created_at.asc()))
            .load::<BankAccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BankAccount::from).collect())
    }

    fn get(&self, family_id: &str, account_id: &str) -> Result<BankAccount> {
        let mut conn = get_connection(&self.pool)?;
        load_account(&mut conn, family_id, account_id).map(BankAccount::from)
    }

    async fn create(
        &self,
        family_id: &str,
        currency: &str,
        account: NewBankAccount,
    ) -> Result<BankAccount> {
        let now = Utc::now().naive_utc();
        let row = BankAccountDB {
            id: Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            connection_id: None,
            provider_account_id: None,
            name: account.name.trim().to_string(),
            institution_name: account.institution_name,
            account_type: account.account_type.as_str().to_string(),
            mask: account.mask,
            current_balance: account.current_balance.to_string(),
            available_balance: account.available_balance.map(|b| b.to_string()),
            currency: account.currency.unwrap_or_else(|| currency.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BankAccount> {
                diesel::insert_into(bank_accounts::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(BankAccount::from(row))
            })
            .await
    }

    async fn update(
        &self,
        family_id: &str,
        account_id: &str,
        update: BankAccountUpdate,
    ) -> Result<BankAccount> {
        let family_id = family_id.to_string();
        let account_id = account_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BankAccount> {
                let current = load_account(conn, &family_id, &account_id)?;
                let name = update
                    .name
                    .map(|n| n.trim().to_string())
                    .unwrap_or(current.name);
                let account_type = update
                    .account_type
                    .map(|t| t.as_str().to_string())
                    .unwrap_or(current.account_type);
                let current_balance = update
                    .current_balance
                    .map(|b| b.to_string())
                    .unwrap_or(current.current_balance);
                let available_balance = update
                    .available_balance
                    .map(|b| b.to_string())
                    .or(current.available_balance);

                diesel::update(bank_accounts::table.find(&account_id))
                    .set((
                        bank_accounts::name.eq(name),
                        bank_accounts::account_type.eq(account_type),
                        bank_accounts::current_balance.eq(current_balance),
                        bank_accounts::available_balance.eq(available_balance),
                        bank_accounts::is_active.eq(update.is_active.unwrap_or(current.is_active)),
                        bank_accounts::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_account(conn, &family_id, &account_id).map(BankAccount::from)
            })
            .await
    }

    async fn delete(&self, family_id: &str, account_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let account_id = account_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                load_account(conn, &family_id, &account_id)?;
                diesel::delete(
                    transactions::table.filter(transactions::bank_account_id.eq(&account_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::delete(bank_accounts::table.find(&account_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

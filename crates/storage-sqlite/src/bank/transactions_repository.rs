use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::bank::{
    check_transaction_delete, NewTransaction, Transaction, TransactionFilter, TransactionPage,
    TransactionRepositoryTrait, TransactionUpdate,
};
use kgiq_core::Result;

use super::model::TransactionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::transactions;
use crate::utils::{like_contains, LIKE_ESCAPE};
use crate::utils::{chunk_for_sqlite, parse_decimal};

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_transaction(
    conn: &mut SqliteConnection,
    family: &str,
    transaction_id: &str,
) -> Result<TransactionDB> {
    transactions::table
        .filter(transactions::id.eq(transaction_id))
        .filter(transactions::family_id.eq(family))
        .first::<TransactionDB>(conn)
        .or_not_found("Transaction", transaction_id)
}

fn filtered<'a>(
    family: &'a str,
    filter: &'a TransactionFilter,
) -> transactions::BoxedQuery<'a, Sqlite> {
    let mut query = transactions::table
        .filter(transactions::family_id.eq(family))
        .into_boxed();
    if let Some(account) = &filter.bank_account_id {
        query = query.filter(transactions::bank_account_id.eq(account));
    }
    if filter.uncategorized {
        query = query.filter(transactions::budget_category_id.is_null());
    } else if let Some(category) = &filter.budget_category_id {
        query = query.filter(transactions::budget_category_id.eq(category));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(transactions::transaction_date.ge(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(transactions::transaction_date.le(end));
    }
    if let Some(pending) = filter.pending {
        query = query.filter(transactions::pending.eq(pending));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            // LIKE is case-insensitive for ASCII in SQLite.
            let pattern = like_contains(search);
            query = query.filter(
                transactions::description
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE)
                    .or(transactions::merchant_name
                        .like(pattern)
                        .escape(LIKE_ESCAPE)
                        .assume_not_null()),
            );
        }
    }
    query
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn list(&self, family_id: &str, filter: &TransactionFilter) -> Result<TransactionPage> {
        let mut conn = get_connection(&self.pool)?;
        let limit = filter.page_limit();
        let offset = filter.page_offset();

        let total = filtered(family_id, filter)
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;

        let rows = filtered(family_id, filter)
            .order((
                transactions::transaction_date.desc(),
                transactions::created_at.desc(),
            ))
            .limit(limit)
            .offset(offset)
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(TransactionPage {
            transactions: rows.into_iter().map(Transaction::from).collect(),
            total,
            limit,
            offset,
        })
    }

    fn get(&self, family_id: &str, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        load_transaction(&mut conn, family_id, transaction_id).map(Transaction::from)
    }

    async fn create(&self, family_id: &str, transaction: NewTransaction) -> Result<Transaction> {
        let now = Utc::now().naive_utc();
        let row = TransactionDB {
            id: Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            bank_account_id: transaction.bank_account_id,
            provider_transaction_id: None,
            amount: transaction.amount.to_string(),
            transaction_date: transaction.transaction_date,
            merchant_name: transaction.merchant_name,
            description: transaction.description.trim().to_string(),
            budget_category_id: transaction.budget_category_id,
            pending: transaction.pending,
            notes: transaction.notes,
            created_at: now,
            updated_at: now,
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Transaction::from(row))
            })
            .await
    }

    async fn update(
        &self,
        family_id: &str,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        let family_id = family_id.to_string();
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let current = load_transaction(conn, &family_id, &transaction_id)?;
                let category = match update.budget_category_id {
                    Some(value) => value,
                    None => current.budget_category_id,
                };
                diesel::update(transactions::table.find(&transaction_id))
                    .set((
                        transactions::budget_category_id.eq(category),
                        transactions::notes.eq(update.notes.or(current.notes)),
                        transactions::description.eq(update
                            .description
                            .map(|d| d.trim().to_string())
                            .unwrap_or(current.description)),
                        transactions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_transaction(conn, &family_id, &transaction_id).map(Transaction::from)
            })
            .await
    }

    async fn delete(&self, family_id: &str, transaction_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let current =
                    Transaction::from(load_transaction(conn, &family_id, &transaction_id)?);
                check_transaction_delete(&current)?;
                diesel::delete(transactions::table.find(&transaction_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn bulk_categorize(
        &self,
        family_id: &str,
        transaction_ids: Vec<String>,
        budget_category_id: Option<String>,
    ) -> Result<usize> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let now = Utc::now().naive_utc();
                let mut changed = 0;
                for chunk in chunk_for_sqlite(&transaction_ids) {
                    changed += diesel::update(
                        transactions::table
                            .filter(transactions::family_id.eq(&family_id))
                            .filter(transactions::id.eq_any(chunk)),
                    )
                    .set((
                        transactions::budget_category_id.eq(&budget_category_id),
                        transactions::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(changed)
            })
            .await
    }

    fn spending_by_category(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HashMap<Option<String>, Decimal>> {
        let mut conn = get_connection(&self.pool)?;
        // Amounts are TEXT, so the sign test and sum happen here.
        let rows = transactions::table
            .filter(transactions::family_id.eq(family_id))
            .filter(transactions::transaction_date.between(start_date, end_date))
            .select((transactions::budget_category_id, transactions::amount))
            .load::<(Option<String>, String)>(&mut conn)
            .map_err(StorageError::from)?;

        let mut totals: HashMap<Option<String>, Decimal> = HashMap::new();
        for (category, amount) in rows {
            let amount = parse_decimal(&amount, "amount");
            if amount > Decimal::ZERO {
                let total = totals.entry(category).or_insert(Decimal::ZERO);
                *total = total.saturating_add(amount);
            }
        }
        Ok(totals)
    }

    fn list_between(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::family_id.eq(family_id))
            .filter(transactions::transaction_date.between(start_date, end_date))
            .order(transactions::transaction_date.asc())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}

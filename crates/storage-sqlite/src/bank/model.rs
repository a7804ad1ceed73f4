//! Database models for bank data.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use kgiq_core::bank::{
    AccountType, BankAccount, BankConnection, ConnectionSecret, ConnectionStatus, Transaction,
};

use crate::utils::{parse_decimal, parse_enum, parse_optional_decimal};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::bank_connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BankConnectionDB {
    pub id: String,
    pub family_id: String,
    pub institution_name: String,
    pub provider_item_id: String,
    pub encrypted_access_token: String,
    pub sync_cursor: Option<String>,
    pub status: String,
    pub last_error: Option<String>,
    pub last_synced_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::bank_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BankAccountDB {
    pub id: String,
    pub family_id: String,
    pub connection_id: Option<String>,
    pub provider_account_id: Option<String>,
    pub name: String,
    pub institution_name: Option<String>,
    pub account_type: String,
    pub mask: Option<String>,
    pub current_balance: String,
    pub available_balance: Option<String>,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(BankAccountDB, foreign_key = bank_account_id))]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub family_id: String,
    pub bank_account_id: String,
    pub provider_transaction_id: Option<String>,
    pub amount: String,
    pub transaction_date: NaiveDate,
    pub merchant_name: Option<String>,
    pub description: String,
    pub budget_category_id: Option<String>,
    pub pending: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<BankConnectionDB> for BankConnection {
    fn from(db: BankConnectionDB) -> Self {
        Self {
            status: parse_enum(&db.status, "status", ConnectionStatus::Error),
            id: db.id,
            family_id: db.family_id,
            institution_name: db.institution_name,
            provider_item_id: db.provider_item_id,
            last_error: db.last_error,
            last_synced_at: db.last_synced_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<BankConnectionDB> for ConnectionSecret {
    fn from(db: BankConnectionDB) -> Self {
        Self {
            connection_id: db.id,
            encrypted_access_token: db.encrypted_access_token,
            sync_cursor: db.sync_cursor,
        }
    }
}

impl From<BankAccountDB> for BankAccount {
    fn from(db: BankAccountDB) -> Self {
        Self {
            account_type: parse_enum(&db.account_type, "account_type", AccountType::Other),
            current_balance: parse_decimal(&db.current_balance, "current_balance"),
            available_balance: parse_optional_decimal(
                db.available_balance.as_deref(),
                "available_balance",
            ),
            id: db.id,
            family_id: db.family_id,
            connection_id: db.connection_id,
            provider_account_id: db.provider_account_id,
            name: db.name,
            institution_name: db.institution_name,
            mask: db.mask,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            amount: parse_decimal(&db.amount, "amount"),
            id: db.id,
            family_id: db.family_id,
            bank_account_id: db.bank_account_id,
            provider_transaction_id: db.provider_transaction_id,
            transaction_date: db.transaction_date,
            merchant_name: db.merchant_name,
            description: db.description,
            budget_category_id: db.budget_category_id,
            pending: db.pending,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

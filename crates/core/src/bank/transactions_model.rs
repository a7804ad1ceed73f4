//! Transaction models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{Error, Result};
use crate::utils::{double_option, require_amount_within_limit};

/// A posted or pending account movement. Positive amounts are outflows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub family_id: String,
    pub bank_account_id: String,
    pub provider_transaction_id: Option<String>,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub merchant_name: Option<String>,
    pub description: String,
    pub budget_category_id: Option<String>,
    pub pending: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    pub fn is_outflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub bank_account_id: String,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub merchant_name: Option<String>,
    pub description: String,
    pub budget_category_id: Option<String>,
    #[serde(default)]
    pub pending: bool,
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::invalid_input("Description cannot be empty"));
        }
        if self.amount.is_zero() {
            return Err(Error::invalid_input("Transaction amount cannot be zero"));
        }
        require_amount_within_limit("Transaction amount", self.amount)?;
        Ok(())
    }
}

/// Editable fields. `budgetCategoryId: null` uncategorizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub budget_category_id: Option<Option<String>>,
    pub notes: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub bank_account_id: Option<String>,
    pub budget_category_id: Option<String>,
    /// Only transactions without a category.
    #[serde(default)]
    pub uncategorized: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive match on merchant name or description.
    pub search: Option<String>,
    pub pending: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::invalid_input("startDate must not be after endDate"));
            }
        }
        if matches!(self.offset, Some(o) if o < 0) {
            return Err(Error::invalid_input("offset cannot be negative"));
        }
        Ok(())
    }

    pub fn page_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// One page of transactions, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCategorize {
    pub transaction_ids: Vec<String>,
    pub budget_category_id: Option<String>,
}

/// Provider-imported transactions are owned by the sync and cannot be deleted.
pub fn check_transaction_delete(transaction: &Transaction) -> Result<()> {
    if transaction.provider_transaction_id.is_some() {
        return Err(Error::Conflict(
            "Transactions imported from a linked account cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

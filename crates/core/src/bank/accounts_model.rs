//! Bank account models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::utils::require_amount_within_limit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Credit,
    Loan,
    Investment,
    Other,
}

string_enum!(AccountType, "account type", {
    Checking => "CHECKING",
    Savings => "SAVINGS",
    Credit => "CREDIT",
    Loan => "LOAN",
    Investment => "INVESTMENT",
    Other => "OTHER",
});

impl AccountType {
    /// Credit and loan balances count against net worth.
    pub fn is_liability(&self) -> bool {
        matches!(self, AccountType::Credit | AccountType::Loan)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub family_id: String,
    pub connection_id: Option<String>,
    pub provider_account_id: Option<String>,
    pub name: String,
    pub institution_name: Option<String>,
    pub account_type: AccountType,
    pub mask: Option<String>,
    pub current_balance: Decimal,
    pub available_balance: Option<Decimal>,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BankAccount {
    /// Entered by hand rather than linked through the provider.
    pub fn is_manual(&self) -> bool {
        self.connection_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBankAccount {
    pub name: String,
    pub institution_name: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    pub mask: Option<String>,
    #[serde(default)]
    pub current_balance: Decimal,
    pub available_balance: Option<Decimal>,
    pub currency: Option<String>,
}

impl NewBankAccount {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Account name cannot be empty"));
        }
        if let Some(mask) = &self.mask {
            if mask.len() > 4 || !mask.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::invalid_input("Mask must be up to four digits"));
            }
        }
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(Error::invalid_input(
                    "Currency must be a three-letter ISO code",
                ));
            }
        }
        validate_balances(Some(self.current_balance), self.available_balance)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub current_balance: Option<Decimal>,
    pub available_balance: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl BankAccountUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::invalid_input("Account name cannot be empty"));
            }
        }
        validate_balances(self.current_balance, self.available_balance)
    }

    pub fn touches_balances(&self) -> bool {
        self.current_balance.is_some() || self.available_balance.is_some()
    }
}

fn validate_balances(current: Option<Decimal>, available: Option<Decimal>) -> Result<()> {
    if let Some(current) = current {
        require_amount_within_limit("Current balance", current)?;
    }
    if let Some(available) = available {
        require_amount_within_limit("Available balance", available)?;
    }
    Ok(())
}

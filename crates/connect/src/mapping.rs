//! Conversion of Plaid payloads into provider-neutral core types.

use rust_decimal::Decimal;

use kgiq_core::bank::{AccountType, ProviderAccount, ProviderTransaction, TransactionSyncPage};

use crate::models::{PlaidAccount, PlaidErrorResponse, PlaidTransaction, TransactionsSyncResponse};

/// Maps Plaid's `type`/`subtype` pair onto our account types.
pub(crate) fn account_type(plaid_type: &str, subtype: Option<&str>) -> AccountType {
    match plaid_type.to_ascii_lowercase().as_str() {
        "depository" => match subtype.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("savings") | Some("money market") | Some("cd") | Some("hsa") => {
                AccountType::Savings
            }
            _ => AccountType::Checking,
        },
        "credit" => AccountType::Credit,
        "loan" => AccountType::Loan,
        "investment" | "brokerage" => AccountType::Investment,
        _ => AccountType::Other,
    }
}

pub(crate) fn to_provider_account(account: PlaidAccount) -> ProviderAccount {
    let account_type = account_type(&account.account_type, account.subtype.as_deref());
    let currency = account
        .balances
        .iso_currency_code
        .or(account.balances.unofficial_currency_code);
    let name = if account.name.trim().is_empty() {
        account.official_name.unwrap_or(account.name)
    } else {
        account.name
    };
    ProviderAccount {
        provider_account_id: account.account_id,
        name,
        account_type,
        mask: account.mask,
        current_balance: account.balances.current.unwrap_or(Decimal::ZERO),
        available_balance: account.balances.available,
        currency,
    }
}

pub(crate) fn to_provider_transaction(transaction: PlaidTransaction) -> ProviderTransaction {
    let description = transaction
        .name
        .filter(|n| !n.trim().is_empty())
        .or(transaction.original_description)
        .or_else(|| transaction.merchant_name.clone())
        .unwrap_or_else(|| "Unknown transaction".to_string());
    ProviderTransaction {
        provider_transaction_id: transaction.transaction_id,
        provider_account_id: transaction.account_id,
        amount: transaction.amount,
        date: transaction.date,
        merchant_name: transaction.merchant_name,
        description,
        pending: transaction.pending,
    }
}

pub(crate) fn to_sync_page(response: TransactionsSyncResponse) -> TransactionSyncPage {
    TransactionSyncPage {
        added: response
            .added
            .into_iter()
            .map(to_provider_transaction)
            .collect(),
        modified: response
            .modified
            .into_iter()
            .map(to_provider_transaction)
            .collect(),
        removed: response
            .removed
            .into_iter()
            .map(|r| r.transaction_id)
            .collect(),
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    }
}

/// Human readable message for a failed Plaid call.
pub(crate) fn error_message(status: u16, error: &PlaidErrorResponse) -> String {
    let code = error
        .error_code
        .as_deref()
        .or(error.error_type.as_deref())
        .unwrap_or("UNKNOWN");
    let message = error
        .error_message
        .as_deref()
        .or(error.display_message.as_deref())
        .unwrap_or("no details");
    format!("Plaid returned HTTP {} ({}): {}", status, code, message)
}

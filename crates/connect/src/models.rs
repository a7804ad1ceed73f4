//! Request and response bodies of the Plaid endpoints we call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LinkTokenUser<'a> {
    pub client_user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LinkTokenCreateRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub client_name: &'a str,
    pub user: LinkTokenUser<'a>,
    pub products: &'a [&'a str],
    pub country_codes: &'a [String],
    pub language: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublicTokenExchangeRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub public_token: &'a str,
}

/// Body shared by the endpoints that only need an item's access token.
#[derive(Debug, Serialize)]
pub(crate) struct AccessTokenRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub access_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransactionsSyncRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
    pub count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LinkTokenCreateResponse {
    pub link_token: String,
    #[serde(default)]
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublicTokenExchangeResponse {
    pub access_token: String,
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsGetResponse {
    #[serde(default)]
    pub accounts: Vec<PlaidAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaidAccount {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    pub balances: PlaidBalances,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PlaidBalances {
    #[serde(default)]
    pub current: Option<Decimal>,
    #[serde(default)]
    pub available: Option<Decimal>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub unofficial_currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsSyncResponse {
    #[serde(default)]
    pub added: Vec<PlaidTransaction>,
    #[serde(default)]
    pub modified: Vec<PlaidTransaction>,
    #[serde(default)]
    pub removed: Vec<RemovedTransaction>,
    pub next_cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaidTransaction {
    pub transaction_id: String,
    pub account_id: String,
    /// Positive when money leaves the account.
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub original_description: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemovedTransaction {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaidErrorResponse {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub display_message: Option<String>,
}

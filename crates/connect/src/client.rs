//! HTTP client for the Plaid API.
//!
//! Every Plaid endpoint is a `POST` with a JSON body carrying the client
//! credentials. Failures, transport or API, surface as [`Error::Provider`]
//! so the sync service can record them on the connection.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use kgiq_core::bank::{
    BankDataProvider, LinkToken, ProviderAccount, TokenExchange, TransactionSyncPage,
};
use kgiq_core::errors::{Error, Result};

use crate::mapping::{error_message, to_provider_account, to_sync_page};
use crate::models::{
    AccessTokenRequest, AccountsGetResponse, LinkTokenCreateRequest, LinkTokenCreateResponse,
    LinkTokenUser, PlaidErrorResponse, PublicTokenExchangeRequest, PublicTokenExchangeResponse,
    TransactionsSyncRequest, TransactionsSyncResponse,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transactions requested per `/transactions/sync` page (Plaid's maximum).
const SYNC_PAGE_SIZE: u32 = 500;

/// Shown to the user inside Plaid Link.
pub const DEFAULT_CLIENT_NAME: &str = "KGiQ Family Finance";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaidEnvironment {
    #[default]
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "sandbox",
            PlaidEnvironment::Development => "development",
            PlaidEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for PlaidEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaidEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" => Ok(PlaidEnvironment::Development),
            "production" => Ok(PlaidEnvironment::Production),
            other => Err(Error::invalid_input(format!(
                "Unknown Plaid environment '{}' (expected sandbox, development or production)",
                other
            ))),
        }
    }
}

/// Credentials and options for [`PlaidClient`].
#[derive(Clone)]
pub struct PlaidConfig {
    pub client_id: String,
    pub secret: String,
    pub environment: PlaidEnvironment,
    pub client_name: String,
    pub country_codes: Vec<String>,
    /// Overrides the environment's base URL.
    pub base_url: Option<String>,
}

impl PlaidConfig {
    pub fn new(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        environment: PlaidEnvironment,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
            environment,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            country_codes: vec!["US".to_string()],
            base_url: None,
        }
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("client_id", &self.client_id)
            .field("secret", &"***")
            .field("environment", &self.environment)
            .field("client_name", &self.client_name)
            .field("country_codes", &self.country_codes)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// HTTP client for the Plaid API.
///
/// # Example
///
/// ```ignore
/// let config = PlaidConfig::new("client-id", "secret", PlaidEnvironment::Sandbox);
/// let client = PlaidClient::new(config)?;
/// let link = client.create_link_token("member-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlaidClient {
    client: reqwest::Client,
    base_url: String,
    config: PlaidConfig,
}

impl PlaidClient {
    /// Create a new Plaid client.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are empty or the HTTP client
    /// cannot be initialized.
    pub fn new(config: PlaidConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() || config.secret.trim().is_empty() {
            return Err(Error::invalid_input(
                "Plaid client id and secret are required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(config.environment.base_url())
            .trim_end_matches('/')
            .to_string();

        info!(
            "Plaid client configured for {} ({})",
            config.environment, base_url
        );
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn environment(&self) -> PlaidEnvironment {
        self.config.environment
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn access_request<'a>(&'a self, access_token: &'a str) -> AccessTokenRequest<'a> {
        AccessTokenRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token,
        }
    }

    /// Make a POST request and parse the response.
    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[Plaid] POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request to {} failed: {}", path, e)))?;

        self.parse_response(response).await
    }

    /// Parse an HTTP response, handling errors appropriately.
    async fn parse_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Provider(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<PlaidErrorResponse>(&body) {
                return Err(Error::Provider(error_message(status.as_u16(), &err)));
            }
            return Err(Error::Provider(format!(
                "Plaid returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Provider(format!("Failed to parse Plaid response: {}", e)))
    }
}

#[async_trait]
impl BankDataProvider for PlaidClient {
    async fn create_link_token(&self, client_user_id: &str) -> Result<LinkToken> {
        let request = LinkTokenCreateRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            client_name: &self.config.client_name,
            user: LinkTokenUser { client_user_id },
            products: &["transactions"],
            country_codes: &self.config.country_codes,
            language: "en",
        };
        let response: LinkTokenCreateResponse = self.post("/link/token/create", &request).await?;
        Ok(LinkToken {
            link_token: response.link_token,
            expiration: response.expiration,
        })
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange> {
        let request = PublicTokenExchangeRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            public_token,
        };
        let response: PublicTokenExchangeResponse = self
            .post("/item/public_token/exchange", &request)
            .await?;
        info!("[Plaid] Exchanged public token for item {}", response.item_id);
        Ok(TokenExchange {
            access_token: response.access_token,
            item_id: response.item_id,
        })
    }

    async fn get_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>> {
        let response: AccountsGetResponse = self
            .post("/accounts/get", &self.access_request(access_token))
            .await?;
        debug!("[Plaid] Fetched {} accounts", response.accounts.len());
        Ok(response
            .accounts
            .into_iter()
            .map(to_provider_account)
            .collect())
    }

    async fn sync_transactions(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionSyncPage> {
        let request = TransactionsSyncRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token,
            cursor: cursor.filter(|c| !c.is_empty()),
            count: SYNC_PAGE_SIZE,
        };
        let response: TransactionsSyncResponse =
            self.post("/transactions/sync", &request).await?;
        Ok(to_sync_page(response))
    }

    async fn remove_item(&self, access_token: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post("/item/remove", &self.access_request(access_token))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlaidConfig {
        PlaidConfig::new("client-id", "secret", PlaidEnvironment::Sandbox)
    }

    #[test]
    fn test_client_creation() {
        let client = PlaidClient::new(config()).unwrap();
        assert_eq!(client.base_url, "https://sandbox.plaid.com");
        assert_eq!(client.environment(), PlaidEnvironment::Sandbox);
    }

    #[test]
    fn test_client_url_override_normalization() {
        let mut config = config();
        config.base_url = Some("http://localhost:9999/".to_string());
        let client = PlaidClient::new(config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_client_requires_credentials() {
        let config = PlaidConfig::new("", "secret", PlaidEnvironment::Sandbox);
        assert!(matches!(
            PlaidClient::new(config),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "Production".parse::<PlaidEnvironment>().unwrap(),
            PlaidEnvironment::Production
        );
        assert_eq!(
            " development ".parse::<PlaidEnvironment>().unwrap().base_url(),
            "https://development.plaid.com"
        );
        assert!("staging".parse::<PlaidEnvironment>().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("client-id"));
        assert!(!rendered.contains("\"secret\""));
    }

    #[test]
    fn test_sync_request_omits_missing_cursor() {
        let request = TransactionsSyncRequest {
            client_id: "id",
            secret: "s",
            access_token: "access",
            cursor: None,
            count: SYNC_PAGE_SIZE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("cursor").is_none());
        assert_eq!(json["count"], 500);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_provider_error() {
        let mut config = config();
        config.base_url = Some("http://127.0.0.1:1".to_string());
        let client = PlaidClient::new(config).unwrap();
        let err = client.get_accounts("access-token").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}

use super::*;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Implementations
// ============================================================================

/// Serves a fixed sequence of sync pages.
struct MockProvider {
    pages: Mutex<Vec<TransactionSyncPage>>,
    cursors_seen: Mutex<Vec<Option<String>>>,
    fail_sync: bool,
    removed_items: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(pages: Vec<TransactionSyncPage>) -> Self {
        Self {
            pages: Mutex::new(pages),
            cursors_seen: Mutex::new(Vec::new()),
            fail_sync: false,
            removed_items: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BankDataProvider for MockProvider {
    async fn create_link_token(&self, client_user_id: &str) -> Result<LinkToken> {
        Ok(LinkToken {
            link_token: format!("link-{}", client_user_id),
            expiration: None,
        })
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange> {
        Ok(TokenExchange {
            access_token: format!("access-{}", public_token),
            item_id: "item-1".to_string(),
        })
    }

    async fn get_accounts(&self, _access_token: &str) -> Result<Vec<ProviderAccount>> {
        Ok(vec![ProviderAccount {
            provider_account_id: "acc-1".to_string(),
            name: "Checking".to_string(),
            account_type: AccountType::Checking,
            mask: Some("0000".to_string()),
            current_balance: dec!(1200.50),
            available_balance: Some(dec!(1100)),
            currency: Some("USD".to_string()),
        }])
    }

    async fn sync_transactions(
        &self,
        _access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionSyncPage> {
        if self.fail_sync {
            return Err(Error::Provider("ITEM_LOGIN_REQUIRED".to_string()));
        }
        self.cursors_seen
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            return Ok(TransactionSyncPage {
                next_cursor: cursor.unwrap_or_default().to_string(),
                ..Default::default()
            });
        }
        Ok(pages.remove(0))
    }

    async fn remove_item(&self, access_token: &str) -> Result<()> {
        self.removed_items
            .lock()
            .unwrap()
            .push(access_token.to_string());
        Ok(())
    }
}

/// Reverses the token; enough to prove the service never stores plaintext.
struct ReverseCipher;

impl TokenCipher for ReverseCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.chars().rev().collect())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.chars().rev().collect())
    }
}

#[derive(Default)]
struct MockConnectionRepository {
    connections: Mutex<Vec<BankConnection>>,
    secrets: Mutex<Vec<ConnectionSecret>>,
    applied: Mutex<Vec<SyncBatch>>,
}

#[async_trait]
impl BankConnectionRepositoryTrait for MockConnectionRepository {
    async fn create_connection(
        &self,
        family_id: &str,
        connection: NewBankConnection,
        accounts: Vec<ProviderAccount>,
    ) -> Result<(BankConnection, Vec<BankAccount>)> {
        let now = Utc::now().naive_utc();
        let created = BankConnection {
            id: "conn-1".to_string(),
            family_id: family_id.to_string(),
            institution_name: connection.institution_name,
            provider_item_id: connection.provider_item_id,
            status: ConnectionStatus::Active,
            last_error: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        self.secrets.lock().unwrap().push(ConnectionSecret {
            connection_id: created.id.clone(),
            encrypted_access_token: connection.encrypted_access_token,
            sync_cursor: None,
        });
        self.connections.lock().unwrap().push(created.clone());
        let accounts = accounts
            .into_iter()
            .map(|a| BankAccount {
                id: format!("local-{}", a.provider_account_id),
                family_id: family_id.to_string(),
                connection_id: Some(created.id.clone()),
                provider_account_id: Some(a.provider_account_id),
                name: a.name,
                institution_name: Some(created.institution_name.clone()),
                account_type: a.account_type,
                mask: a.mask,
                current_balance: a.current_balance,
                available_balance: a.available_balance,
                currency: a.currency.unwrap_or_else(|| "USD".to_string()),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .collect();
        Ok((created, accounts))
    }

    fn list_connections(&self, family_id: &str) -> Result<Vec<BankConnection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.family_id == family_id)
            .cloned()
            .collect())
    }

    fn get_connection(&self, family_id: &str, connection_id: &str) -> Result<BankConnection> {
        self.list_connections(family_id)?
            .into_iter()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| Error::not_found("Bank connection", connection_id))
    }

    fn list_syncable_connections(&self) -> Result<Vec<BankConnection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status != ConnectionStatus::Disconnected)
            .cloned()
            .collect())
    }

    fn get_secret(&self, connection_id: &str) -> Result<ConnectionSecret> {
        self.secrets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.connection_id == connection_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Bank connection", connection_id))
    }

    async fn apply_sync(&self, connection_id: &str, batch: SyncBatch) -> Result<SyncSummary> {
        for secret in self.secrets.lock().unwrap().iter_mut() {
            if secret.connection_id == connection_id {
                secret.sync_cursor = batch.next_cursor.clone();
            }
        }
        let summary = SyncSummary {
            connection_id: connection_id.to_string(),
            accounts_updated: batch.accounts.len(),
            added: batch.added.len(),
            modified: batch.modified.len(),
            removed: batch.removed.len(),
        };
        self.applied.lock().unwrap().push(batch);
        Ok(summary)
    }

    async fn record_sync_error(&self, connection_id: &str, message: String) -> Result<()> {
        for connection in self.connections.lock().unwrap().iter_mut() {
            if connection.id == connection_id {
                connection.status = ConnectionStatus::Error;
                connection.last_error = Some(message.clone());
            }
        }
        Ok(())
    }

    async fn mark_disconnected(
        &self,
        family_id: &str,
        connection_id: &str,
    ) -> Result<BankConnection> {
        let mut connections = self.connections.lock().unwrap();
        let connection = connections
            .iter_mut()
            .find(|c| c.family_id == family_id && c.id == connection_id)
            .ok_or_else(|| Error::not_found("Bank connection", connection_id))?;
        connection.status = ConnectionStatus::Disconnected;
        Ok(connection.clone())
    }
}

fn provider_transaction(id: &str, amount: rust_decimal::Decimal) -> ProviderTransaction {
    ProviderTransaction {
        provider_transaction_id: id.to_string(),
        provider_account_id: "acc-1".to_string(),
        amount,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        merchant_name: None,
        description: "Coffee".to_string(),
        pending: false,
    }
}

fn two_pages() -> Vec<TransactionSyncPage> {
    vec![
        TransactionSyncPage {
            added: vec![provider_transaction("t1", dec!(4.50))],
            next_cursor: "c1".to_string(),
            has_more: true,
            ..Default::default()
        },
        TransactionSyncPage {
            added: vec![provider_transaction("t2", dec!(-1000))],
            modified: vec![provider_transaction("t1", dec!(5.00))],
            removed: vec!["t0".to_string()],
            next_cursor: "c2".to_string(),
            has_more: false,
        },
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn unconfigured_provider_is_reported() {
    let service = SyncService::new(
        Arc::new(MockConnectionRepository::default()),
        None,
        Arc::new(ReverseCipher),
    );
    assert!(!service.is_configured());
    assert!(matches!(
        service.create_link_token("member").await.unwrap_err(),
        Error::ProviderNotConfigured
    ));
    assert!(matches!(
        service.sync_all().await.unwrap_err(),
        Error::ProviderNotConfigured
    ));
}

#[tokio::test]
async fn link_stores_encrypted_token_and_accounts() {
    let repo = Arc::new(MockConnectionRepository::default());
    let service = SyncService::new(
        repo.clone(),
        Some(Arc::new(MockProvider::new(vec![]))),
        Arc::new(ReverseCipher),
    );

    let (connection, accounts) = service
        .link("fam", "public-abc", Some("First Bank".to_string()))
        .await
        .unwrap();
    assert_eq!(connection.institution_name, "First Bank");
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].connection_id.as_deref(), Some("conn-1"));

    let secret = repo.get_secret("conn-1").unwrap();
    assert_ne!(secret.encrypted_access_token, "access-public-abc");
    assert_eq!(
        ReverseCipher.decrypt(&secret.encrypted_access_token).unwrap(),
        "access-public-abc"
    );
}

#[tokio::test]
async fn sync_pages_through_cursor_and_applies_once() {
    let repo = Arc::new(MockConnectionRepository::default());
    let provider = Arc::new(MockProvider::new(two_pages()));
    let service = SyncService::new(repo.clone(), Some(provider.clone()), Arc::new(ReverseCipher));
    service.link("fam", "public-abc", None).await.unwrap();

    let summary = service.sync_connection("fam", "conn-1").await.unwrap();
    assert_eq!(summary.added, 2);
    assert_eq!(summary.modified, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.accounts_updated, 1);

    assert_eq!(
        *provider.cursors_seen.lock().unwrap(),
        vec![None, Some("c1".to_string())]
    );
    assert_eq!(repo.applied.lock().unwrap().len(), 1);
    assert_eq!(
        repo.get_secret("conn-1").unwrap().sync_cursor.as_deref(),
        Some("c2")
    );
}

#[tokio::test]
async fn provider_failure_marks_connection_errored() {
    let repo = Arc::new(MockConnectionRepository::default());
    let mut provider = MockProvider::new(vec![]);
    provider.fail_sync = true;
    let service = SyncService::new(repo.clone(), Some(Arc::new(provider)), Arc::new(ReverseCipher));
    service.link("fam", "public-abc", None).await.unwrap();

    let err = service.sync_connection("fam", "conn-1").await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));

    let connection = repo.get_connection("fam", "conn-1").unwrap();
    assert_eq!(connection.status, ConnectionStatus::Error);
    assert!(connection
        .last_error
        .unwrap()
        .contains("ITEM_LOGIN_REQUIRED"));

    // sync_family swallows the failure after recording it
    assert!(service.sync_family("fam").await.unwrap().is_empty());
}

#[tokio::test]
async fn disconnect_removes_item_and_stops_syncing() {
    let repo = Arc::new(MockConnectionRepository::default());
    let provider = Arc::new(MockProvider::new(vec![]));
    let service = SyncService::new(repo.clone(), Some(provider.clone()), Arc::new(ReverseCipher));
    service.link("fam", "public-abc", None).await.unwrap();

    let disconnected = service.disconnect("fam", "conn-1").await.unwrap();
    assert_eq!(disconnected.status, ConnectionStatus::Disconnected);
    assert_eq!(
        *provider.removed_items.lock().unwrap(),
        vec!["access-public-abc".to_string()]
    );

    let err = service.sync_connection("fam", "conn-1").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(service.sync_all().await.unwrap(), 0);
}

#[tokio::test]
async fn connections_of_other_families_are_not_found() {
    let repo = Arc::new(MockConnectionRepository::default());
    let service = SyncService::new(
        repo,
        Some(Arc::new(MockProvider::new(vec![]))),
        Arc::new(ReverseCipher),
    );
    service.link("fam", "public-abc", None).await.unwrap();
    assert!(matches!(
        service.sync_connection("other", "conn-1").await.unwrap_err(),
        Error::NotFound(_)
    ));
}

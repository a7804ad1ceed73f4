//! Linking institutions and pulling their transactions from the provider.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;

use super::accounts_model::BankAccount;
use super::bank_traits::{
    BankConnectionRepositoryTrait, BankDataProvider, SyncServiceTrait, TokenCipher,
};
use super::connections_model::{
    BankConnection, ConnectionStatus, LinkToken, NewBankConnection, SyncBatch, SyncSummary,
};
use crate::errors::{Error, Result};

/// Upper bound on cursor pages fetched in one sync.
const MAX_SYNC_PAGES: usize = 50;

pub struct SyncService {
    repository: Arc<dyn BankConnectionRepositoryTrait>,
    provider: Option<Arc<dyn BankDataProvider>>,
    cipher: Arc<dyn TokenCipher>,
}

impl SyncService {
    /// `provider` is `None` when the server has no provider credentials.
    pub fn new(
        repository: Arc<dyn BankConnectionRepositoryTrait>,
        provider: Option<Arc<dyn BankDataProvider>>,
        cipher: Arc<dyn TokenCipher>,
    ) -> Self {
        Self {
            repository,
            provider,
            cipher,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn BankDataProvider>> {
        self.provider.as_ref().ok_or(Error::ProviderNotConfigured)
    }

    async fn fetch_batch(&self, connection_id: &str) -> Result<SyncBatch> {
        let provider = self.provider()?;
        let secret = self.repository.get_secret(connection_id)?;
        let access_token = self.cipher.decrypt(&secret.encrypted_access_token)?;

        let mut batch = SyncBatch {
            accounts: provider.get_accounts(&access_token).await?,
            next_cursor: secret.sync_cursor.clone(),
            ..Default::default()
        };

        let mut cursor = secret.sync_cursor;
        for page_number in 1..=MAX_SYNC_PAGES {
            let page = provider
                .sync_transactions(&access_token, cursor.as_deref())
                .await?;
            debug!(
                "Connection {} page {}: +{} ~{} -{}",
                connection_id,
                page_number,
                page.added.len(),
                page.modified.len(),
                page.removed.len()
            );
            let has_more = page.has_more;
            cursor = Some(page.next_cursor.clone());
            batch.absorb(page);
            if !has_more {
                return Ok(batch);
            }
        }
        Err(Error::Provider(format!(
            "Transaction feed did not finish within {} pages",
            MAX_SYNC_PAGES
        )))
    }

    async fn run_sync(&self, connection: &BankConnection) -> Result<SyncSummary> {
        if connection.status == ConnectionStatus::Disconnected {
            return Err(Error::Conflict(
                "Bank connection is disconnected".to_string(),
            ));
        }
        match self.fetch_batch(&connection.id).await {
            Ok(batch) => {
                let summary = self.repository.apply_sync(&connection.id, batch).await?;
                info!(
                    "Synced connection {} ({}): {} added, {} modified, {} removed",
                    connection.id,
                    connection.institution_name,
                    summary.added,
                    summary.modified,
                    summary.removed
                );
                Ok(summary)
            }
            Err(Error::ProviderNotConfigured) => Err(Error::ProviderNotConfigured),
            Err(err) => {
                warn!("Sync of connection {} failed: {}", connection.id, err);
                if let Err(record_err) = self
                    .repository
                    .record_sync_error(&connection.id, err.to_string())
                    .await
                {
                    error!(
                        "Failed to record sync error for connection {}: {}",
                        connection.id, record_err
                    );
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl SyncServiceTrait for SyncService {
    fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    async fn create_link_token(&self, member_id: &str) -> Result<LinkToken> {
        self.provider()?.create_link_token(member_id).await
    }

    async fn link(
        &self,
        family_id: &str,
        public_token: &str,
        institution_name: Option<String>,
    ) -> Result<(BankConnection, Vec<BankAccount>)> {
        if public_token.trim().is_empty() {
            return Err(Error::invalid_input("publicToken cannot be empty"));
        }
        let provider = self.provider()?;
        let exchange = provider.exchange_public_token(public_token).await?;
        let accounts = provider.get_accounts(&exchange.access_token).await?;

        let connection = NewBankConnection {
            institution_name: institution_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Linked institution".to_string()),
            provider_item_id: exchange.item_id,
            encrypted_access_token: self.cipher.encrypt(&exchange.access_token)?,
        };
        let (connection, accounts) = self
            .repository
            .create_connection(family_id, connection, accounts)
            .await?;
        info!(
            "Linked connection {} with {} account(s) for family {}",
            connection.id,
            accounts.len(),
            family_id
        );
        Ok((connection, accounts))
    }

    fn list_connections(&self, family_id: &str) -> Result<Vec<BankConnection>> {
        self.repository.list_connections(family_id)
    }

    async fn sync_connection(
        &self,
        family_id: &str,
        connection_id: &str,
    ) -> Result<SyncSummary> {
        self.provider()?;
        let connection = self.repository.get_connection(family_id, connection_id)?;
        self.run_sync(&connection).await
    }

    async fn sync_family(&self, family_id: &str) -> Result<Vec<SyncSummary>> {
        self.provider()?;
        let mut summaries = Vec::new();
        for connection in self.repository.list_connections(family_id)? {
            if connection.status == ConnectionStatus::Disconnected {
                continue;
            }
            if let Ok(summary) = self.run_sync(&connection).await {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    async fn sync_all(&self) -> Result<usize> {
        self.provider()?;
        let connections = self.repository.list_syncable_connections()?;
        let mut synced = 0;
        for connection in &connections {
            if self.run_sync(connection).await.is_ok() {
                synced += 1;
            }
        }
        info!("Bank sync finished: {}/{} connections", synced, connections.len());
        Ok(synced)
    }

    async fn disconnect(&self, family_id: &str, connection_id: &str) -> Result<BankConnection> {
        let connection = self.repository.get_connection(family_id, connection_id)?;
        if connection.status == ConnectionStatus::Disconnected {
            return Ok(connection);
        }
        // Best effort: the item may already be gone at the provider.
        if let Some(provider) = &self.provider {
            let removal = match self.repository.get_secret(connection_id) {
                Ok(secret) => match self.cipher.decrypt(&secret.encrypted_access_token) {
                    Ok(token) => provider.remove_item(&token).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = removal {
                warn!(
                    "Could not remove item of connection {} at the provider: {}",
                    connection_id, e
                );
            }
        }
        let disconnected = self
            .repository
            .mark_disconnected(family_id, connection_id)
            .await?;
        info!("Disconnected bank connection {}", connection_id);
        Ok(disconnected)
    }
}

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use super::accounts_model::{BankAccount, BankAccountUpdate, NewBankAccount};
use super::bank_traits::{BankAccountRepositoryTrait, BankAccountServiceTrait};
use crate::errors::{Error, Result};

/// Manual and linked bank accounts.
pub struct BankAccountService {
    repository: Arc<dyn BankAccountRepositoryTrait>,
}

impl BankAccountService {
    pub fn new(repository: Arc<dyn BankAccountRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl BankAccountServiceTrait for BankAccountService {
    fn list_accounts(&self, family_id: &str, include_inactive: bool) -> Result<Vec<BankAccount>> {
        self.repository.list(family_id, include_inactive)
    }

    fn get_account(&self, family_id: &str, account_id: &str) -> Result<BankAccount> {
        self.repository.get(family_id, account_id)
    }

    async fn create_account(
        &self,
        family_id: &str,
        family_currency: &str,
        account: NewBankAccount,
    ) -> Result<BankAccount> {
        account.validate()?;
        let currency = account
            .currency
            .clone()
            .unwrap_or_else(|| family_currency.to_string());
        let created = self.repository.create(family_id, &currency, account).await?;
        info!("Created manual account {} for family {}", created.id, family_id);
        Ok(created)
    }

    async fn update_account(
        &self,
        family_id: &str,
        account_id: &str,
        update: BankAccountUpdate,
    ) -> Result<BankAccount> {
        update.validate()?;
        let current = self.repository.get(family_id, account_id)?;
        if !current.is_manual() && update.touches_balances() {
            return Err(Error::invalid_input(
                "Balances of linked accounts are maintained by bank sync",
            ));
        }
        self.repository.update(family_id, account_id, update).await
    }

    async fn delete_account(&self, family_id: &str, account_id: &str) -> Result<()> {
        let current = self.repository.get(family_id, account_id)?;
        if !current.is_manual() {
            return Err(Error::Conflict(
                "Linked accounts are removed by disconnecting their bank connection".to_string(),
            ));
        }
        self.repository.delete(family_id, account_id).await?;
        info!("Deleted account {} of family {}", account_id, family_id);
        Ok(())
    }
}

use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::bank_traits::{
    BankAccountRepositoryTrait, TransactionRepositoryTrait, TransactionServiceTrait,
};
use super::transactions_model::{
    NewTransaction, Transaction, TransactionFilter, TransactionPage, TransactionUpdate,
};
use crate::budget::{ensure_active_category, BudgetRepositoryTrait};
use crate::errors::{Error, Result};

pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn BankAccountRepositoryTrait>,
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn BankAccountRepositoryTrait>,
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            account_repository,
            budget_repository,
        }
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    fn list_transactions(
        &self,
        family_id: &str,
        filter: TransactionFilter,
    ) -> Result<TransactionPage> {
        filter.validate()?;
        self.repository.list(family_id, &filter)
    }

    fn get_transaction(&self, family_id: &str, transaction_id: &str) -> Result<Transaction> {
        self.repository.get(family_id, transaction_id)
    }

    async fn create_transaction(
        &self,
        family_id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction> {
        transaction.validate()?;
        match self
            .account_repository
            .get(family_id, &transaction.bank_account_id)
        {
            Ok(_) => {}
            Err(Error::NotFound(_)) => {
                return Err(Error::invalid_input(format!(
                    "Bank account '{}' does not exist",
                    transaction.bank_account_id
                )))
            }
            Err(e) => return Err(e),
        }
        if let Some(category_id) = &transaction.budget_category_id {
            ensure_active_category(self.budget_repository.as_ref(), family_id, category_id)?;
        }
        let created = self.repository.create(family_id, transaction).await?;
        debug!("Created transaction {} for family {}", created.id, family_id);
        Ok(created)
    }

    async fn update_transaction(
        &self,
        family_id: &str,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        if let Some(description) = &update.description {
            if description.trim().is_empty() {
                return Err(Error::invalid_input("Description cannot be empty"));
            }
        }
        if let Some(Some(category_id)) = &update.budget_category_id {
            ensure_active_category(self.budget_repository.as_ref(), family_id, category_id)?;
        }
        self.repository
            .update(family_id, transaction_id, update)
            .await
    }

    async fn delete_transaction(&self, family_id: &str, transaction_id: &str) -> Result<()> {
        self.repository.delete(family_id, transaction_id).await
    }

    async fn bulk_categorize(
        &self,
        family_id: &str,
        transaction_ids: Vec<String>,
        budget_category_id: Option<String>,
    ) -> Result<usize> {
        if transaction_ids.is_empty() {
            return Err(Error::invalid_input("transactionIds cannot be empty"));
        }
        if let Some(category_id) = &budget_category_id {
            ensure_active_category(self.budget_repository.as_ref(), family_id, category_id)?;
        }
        let updated = self
            .repository
            .bulk_categorize(family_id, transaction_ids, budget_category_id)
            .await?;
        info!("Categorized {} transaction(s) for family {}", updated, family_id);
        Ok(updated)
    }
}

use super::*;
use crate::budget::{
    AllocationLine, BudgetAllocation, BudgetCategory, BudgetCategoryUpdate, BudgetRepositoryTrait,
    NewBudgetCategory,
};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Implementations
// ============================================================================

#[derive(Default)]
struct MockAccountRepository {
    accounts: Mutex<Vec<BankAccount>>,
}

impl MockAccountRepository {
    fn with(accounts: Vec<BankAccount>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl BankAccountRepositoryTrait for MockAccountRepository {
    fn list(&self, family_id: &str, include_inactive: bool) -> Result<Vec<BankAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.family_id == family_id && (include_inactive || a.is_active))
            .cloned()
            .collect())
    }

    fn get(&self, family_id: &str, account_id: &str) -> Result<BankAccount> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.family_id == family_id && a.id == account_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Bank account", account_id))
    }

    async fn create(
        &self,
        family_id: &str,
        currency: &str,
        account: NewBankAccount,
    ) -> Result<BankAccount> {
        let mut created = bank_account("new", None);
        created.family_id = family_id.to_string();
        created.name = account.name;
        created.currency = currency.to_string();
        created.current_balance = account.current_balance;
        self.accounts.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        family_id: &str,
        account_id: &str,
        update: BankAccountUpdate,
    ) -> Result<BankAccount> {
        let mut account = self.get(family_id, account_id)?;
        if let Some(balance) = update.current_balance {
            account.current_balance = balance;
        }
        if let Some(name) = update.name {
            account.name = name;
        }
        Ok(account)
    }

    async fn delete(&self, _family_id: &str, account_id: &str) -> Result<()> {
        self.accounts.lock().unwrap().retain(|a| a.id != account_id);
        Ok(())
    }
}

#[derive(Default)]
struct MockTransactionRepository {
    transactions: Mutex<Vec<Transaction>>,
}

#[async_trait]
impl TransactionRepositoryTrait for MockTransactionRepository {
    fn list(&self, _family_id: &str, filter: &TransactionFilter) -> Result<TransactionPage> {
        let transactions = self.transactions.lock().unwrap().clone();
        Ok(TransactionPage {
            total: transactions.len() as i64,
            transactions,
            limit: filter.page_limit(),
            offset: filter.page_offset(),
        })
    }

    fn get(&self, family_id: &str, transaction_id: &str) -> Result<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.family_id == family_id && t.id == transaction_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Transaction", transaction_id))
    }

    async fn create(&self, family_id: &str, transaction: NewTransaction) -> Result<Transaction> {
        let now = Utc::now().naive_utc();
        let created = Transaction {
            id: format!("tx-{}", self.transactions.lock().unwrap().len() + 1),
            family_id: family_id.to_string(),
            bank_account_id: transaction.bank_account_id,
            provider_transaction_id: None,
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            merchant_name: transaction.merchant_name,
            description: transaction.description,
            budget_category_id: transaction.budget_category_id,
            pending: transaction.pending,
            notes: transaction.notes,
            created_at: now,
            updated_at: now,
        };
        self.transactions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        family_id: &str,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        let mut transaction = self.get(family_id, transaction_id)?;
        if let Some(category) = update.budget_category_id {
            transaction.budget_category_id = category;
        }
        Ok(transaction)
    }

    async fn delete(&self, family_id: &str, transaction_id: &str) -> Result<()> {
        let transaction = self.get(family_id, transaction_id)?;
        check_transaction_delete(&transaction)?;
        self.transactions
            .lock()
            .unwrap()
            .retain(|t| t.id != transaction_id);
        Ok(())
    }

    async fn bulk_categorize(
        &self,
        family_id: &str,
        transaction_ids: Vec<String>,
        budget_category_id: Option<String>,
    ) -> Result<usize> {
        let mut count = 0;
        for transaction in self.transactions.lock().unwrap().iter_mut() {
            if transaction.family_id == family_id && transaction_ids.contains(&transaction.id) {
                transaction.budget_category_id = budget_category_id.clone();
                count += 1;
            }
        }
        Ok(count)
    }

    fn spending_by_category(
        &self,
        _family_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<HashMap<Option<String>, Decimal>> {
        unimplemented!()
    }

    fn list_between(
        &self,
        _family_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        unimplemented!()
    }
}

/// Knows one active ("groceries") and one inactive ("old") category.
struct StubBudgetRepository;

#[async_trait]
impl BudgetRepositoryTrait for StubBudgetRepository {
    fn list_categories(&self, _: &str, _: bool) -> Result<Vec<BudgetCategory>> {
        unimplemented!()
    }

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory> {
        let now = Utc::now().naive_utc();
        let active = match category_id {
            "groceries" => true,
            "old" => false,
            _ => return Err(Error::not_found("Budget category", category_id)),
        };
        Ok(BudgetCategory {
            id: category_id.to_string(),
            family_id: family_id.to_string(),
            name: category_id.to_string(),
            target_percentage: dec!(10),
            color: None,
            sort_order: 0,
            is_active: active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_category(&self, _: &str, _: NewBudgetCategory) -> Result<BudgetCategory> {
        unimplemented!()
    }

    async fn update_category(
        &self,
        _: &str,
        _: &str,
        _: BudgetCategoryUpdate,
    ) -> Result<BudgetCategory> {
        unimplemented!()
    }

    async fn deactivate_category(&self, _: &str, _: &str) -> Result<()> {
        unimplemented!()
    }

    async fn reorder_categories(&self, _: &str, _: Vec<String>) -> Result<Vec<BudgetCategory>> {
        unimplemented!()
    }

    async fn replace_allocations(
        &self,
        _: &str,
        _: &str,
        _: Vec<AllocationLine>,
    ) -> Result<Vec<BudgetAllocation>> {
        unimplemented!()
    }

    fn list_allocations(&self, _: &str, _: &str) -> Result<Vec<BudgetAllocation>> {
        unimplemented!()
    }

    fn list_allocations_between(
        &self,
        _: &str,
        _: NaiveDate,
        _: NaiveDate,
    ) -> Result<Vec<BudgetAllocation>> {
        unimplemented!()
    }
}

fn bank_account(id: &str, connection_id: Option<&str>) -> BankAccount {
    let now = Utc::now().naive_utc();
    BankAccount {
        id: id.to_string(),
        family_id: "fam".to_string(),
        connection_id: connection_id.map(str::to_string),
        provider_account_id: connection_id.map(|_| format!("prov-{}", id)),
        name: "Everyday Checking".to_string(),
        institution_name: None,
        account_type: AccountType::Checking,
        mask: None,
        current_balance: dec!(100),
        available_balance: None,
        currency: "USD".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn new_transaction(account_id: &str, category: Option<&str>) -> NewTransaction {
    NewTransaction {
        bank_account_id: account_id.to_string(),
        amount: dec!(42.50),
        transaction_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        merchant_name: Some("Corner Market".to_string()),
        description: "Groceries".to_string(),
        budget_category_id: category.map(str::to_string),
        pending: false,
        notes: None,
    }
}

fn transaction_service() -> (Arc<MockTransactionRepository>, TransactionService) {
    let transactions = Arc::new(MockTransactionRepository::default());
    let accounts = Arc::new(MockAccountRepository::with(vec![bank_account("manual", None)]));
    let service = TransactionService::new(
        transactions.clone(),
        accounts,
        Arc::new(StubBudgetRepository),
    );
    (transactions, service)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn manual_accounts_default_to_family_currency() {
    let service = BankAccountService::new(Arc::new(MockAccountRepository::default()));
    let account = service
        .create_account(
            "fam",
            "CAD",
            NewBankAccount {
                name: "Cash jar".to_string(),
                institution_name: None,
                account_type: AccountType::Other,
                mask: None,
                current_balance: dec!(80),
                available_balance: None,
                currency: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(account.currency, "CAD");
}

#[tokio::test]
async fn linked_accounts_cannot_be_deleted_or_rebalanced() {
    let repo = Arc::new(MockAccountRepository::with(vec![
        bank_account("linked", Some("conn-1")),
        bank_account("manual", None),
    ]));
    let service = BankAccountService::new(repo);

    let err = service.delete_account("fam", "linked").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let err = service
        .update_account(
            "fam",
            "linked",
            BankAccountUpdate {
                current_balance: Some(dec!(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let renamed = service
        .update_account(
            "fam",
            "linked",
            BankAccountUpdate {
                name: Some("Joint".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Joint");

    service.delete_account("fam", "manual").await.unwrap();
    assert!(matches!(
        service.get_account("fam", "manual").unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn transactions_require_known_account_and_active_category() {
    let (_, service) = transaction_service();

    let err = service
        .create_transaction("fam", new_transaction("missing", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = service
        .create_transaction("fam", new_transaction("manual", Some("old")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let created = service
        .create_transaction("fam", new_transaction("manual", Some("groceries")))
        .await
        .unwrap();
    assert_eq!(created.budget_category_id.as_deref(), Some("groceries"));
    assert!(created.is_outflow());
}

#[tokio::test]
async fn imported_transactions_cannot_be_deleted() {
    let (repo, service) = transaction_service();
    let created = service
        .create_transaction("fam", new_transaction("manual", None))
        .await
        .unwrap();
    repo.transactions.lock().unwrap()[0].provider_transaction_id = Some("plaid-1".to_string());

    let err = service
        .delete_transaction("fam", &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn update_can_clear_category() {
    let (_, service) = transaction_service();
    let created = service
        .create_transaction("fam", new_transaction("manual", Some("groceries")))
        .await
        .unwrap();
    let update: TransactionUpdate =
        serde_json::from_str(r#"{"budgetCategoryId": null}"#).unwrap();
    assert_eq!(update.budget_category_id, Some(None));

    let updated = service
        .update_transaction("fam", &created.id, update)
        .await
        .unwrap();
    assert_eq!(updated.budget_category_id, None);
}

#[tokio::test]
async fn bulk_categorize_counts_changed_rows() {
    let (_, service) = transaction_service();
    let a = service
        .create_transaction("fam", new_transaction("manual", None))
        .await
        .unwrap();
    let b = service
        .create_transaction("fam", new_transaction("manual", None))
        .await
        .unwrap();

    let count = service
        .bulk_categorize(
            "fam",
            vec![a.id, b.id, "unknown".to_string()],
            Some("groceries".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(count, 2);

    let err = service
        .bulk_categorize("fam", vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn filter_page_bounds_are_clamped() {
    let filter = TransactionFilter {
        limit: Some(10_000),
        offset: Some(-3),
        ..Default::default()
    };
    assert_eq!(filter.page_limit(), 500);
    assert_eq!(filter.page_offset(), 0);
    assert!(filter.validate().is_err());
}

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

use super::budget_allocation::{allocate_income, build_performance, summarize_percentages};
use super::budget_model::{
    BudgetAllocation, BudgetCategory, BudgetCategoryUpdate, BudgetPerformance, NewBudgetCategory,
    PercentageSummary,
};
use super::budget_traits::{BudgetRepositoryTrait, BudgetServiceTrait};
use crate::bank::TransactionRepositoryTrait;
use crate::errors::{Error, Result};
use crate::income::{IncomeRepositoryTrait, IncomeStatus};

/// Resolves a category reference from a request body.
///
/// Unknown and inactive categories are reported as invalid input.
pub fn ensure_active_category(
    repository: &dyn BudgetRepositoryTrait,
    family_id: &str,
    category_id: &str,
) -> Result<BudgetCategory> {
    match repository.get_category(family_id, category_id) {
        Ok(category) if category.is_active => Ok(category),
        Ok(_) => Err(Error::invalid_input(format!(
            "Budget category '{}' is inactive",
            category_id
        ))),
        Err(Error::NotFound(_)) => Err(Error::invalid_input(format!(
            "Budget category '{}' does not exist",
            category_id
        ))),
        Err(e) => Err(e),
    }
}

pub struct BudgetService {
    repository: Arc<dyn BudgetRepositoryTrait>,
    income_repository: Arc<dyn IncomeRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
}

impl BudgetService {
    pub fn new(
        repository: Arc<dyn BudgetRepositoryTrait>,
        income_repository: Arc<dyn IncomeRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            income_repository,
            transaction_repository,
        }
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    fn list_categories(
        &self,
        family_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<BudgetCategory>> {
        self.repository.list_categories(family_id, include_inactive)
    }

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory> {
        self.repository.get_category(family_id, category_id)
    }

    async fn create_category(
        &self,
        family_id: &str,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory> {
        category.validate()?;
        let created = self.repository.create_category(family_id, category).await?;
        info!(
            "Created budget category '{}' ({}%) for family {}",
            created.name, created.target_percentage, family_id
        );
        Ok(created)
    }

    async fn update_category(
        &self,
        family_id: &str,
        category_id: &str,
        update: BudgetCategoryUpdate,
    ) -> Result<BudgetCategory> {
        update.validate()?;
        self.repository
            .update_category(family_id, category_id, update)
            .await
    }

    async fn delete_category(&self, family_id: &str, category_id: &str) -> Result<()> {
        self.repository
            .deactivate_category(family_id, category_id)
            .await?;
        info!("Deactivated budget category {}", category_id);
        Ok(())
    }

    async fn reorder_categories(
        &self,
        family_id: &str,
        ordered_ids: Vec<String>,
    ) -> Result<Vec<BudgetCategory>> {
        if ordered_ids.is_empty() {
            return Err(Error::invalid_input("categoryIds cannot be empty"));
        }
        let unique: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        if unique.len() != ordered_ids.len() {
            return Err(Error::invalid_input("categoryIds contains duplicates"));
        }
        self.repository
            .reorder_categories(family_id, ordered_ids)
            .await
    }

    fn percentage_summary(&self, family_id: &str) -> Result<PercentageSummary> {
        let categories = self.repository.list_categories(family_id, false)?;
        Ok(summarize_percentages(&categories))
    }

    async fn generate_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<BudgetAllocation>> {
        let income = self.income_repository.get(family_id, income_event_id)?;
        if income.status == IncomeStatus::Cancelled {
            return Err(Error::Conflict(
                "Cannot allocate a cancelled income event".to_string(),
            ));
        }
        let categories = self.repository.list_categories(family_id, false)?;
        if categories.is_empty() {
            return Err(Error::invalid_input(
                "Create at least one active budget category before generating allocations",
            ));
        }
        let shares: Vec<(String, _)> = categories
            .iter()
            .map(|c| (c.id.clone(), c.target_percentage))
            .collect();
        let lines = allocate_income(income.effective_amount(), &shares)?;
        debug!(
            "Allocating {} of income {} across {} categories",
            income.effective_amount(),
            income.id,
            lines.len()
        );
        self.repository
            .replace_allocations(family_id, income_event_id, lines)
            .await
    }

    fn list_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<BudgetAllocation>> {
        // Scope check: unknown or foreign income events are not found.
        self.income_repository.get(family_id, income_event_id)?;
        self.repository.list_allocations(family_id, income_event_id)
    }

    fn budget_performance(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BudgetPerformance> {
        if start_date > end_date {
            return Err(Error::invalid_input("startDate must not be after endDate"));
        }
        let categories = self.repository.list_categories(family_id, false)?;
        let allocations = self
            .repository
            .list_allocations_between(family_id, start_date, end_date)?;
        let spent = self
            .transaction_repository
            .spending_by_category(family_id, start_date, end_date)?;
        Ok(build_performance(
            start_date,
            end_date,
            &categories,
            &allocations,
            &spent,
        ))
    }
}

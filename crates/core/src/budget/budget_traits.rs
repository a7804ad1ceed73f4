use async_trait::async_trait;
use chrono::NaiveDate;

use super::budget_model::{
    AllocationLine, BudgetAllocation, BudgetCategory, BudgetCategoryUpdate, BudgetPerformance,
    NewBudgetCategory, PercentageSummary,
};
use crate::errors::Result;

/// Persistence contract for budget categories and allocations.
///
/// Implementations must evaluate `check_new_category` and
/// `check_category_update` inside the same write transaction that stores the
/// change, so concurrent requests cannot push the active total over 100%.
#[async_trait]
pub trait BudgetRepositoryTrait: Send + Sync {
    /// Ordered by `sort_order`, then name.
    fn list_categories(&self, family_id: &str, include_inactive: bool)
        -> Result<Vec<BudgetCategory>>;

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory>;

    async fn create_category(
        &self,
        family_id: &str,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory>;

    async fn update_category(
        &self,
        family_id: &str,
        category_id: &str,
        update: BudgetCategoryUpdate,
    ) -> Result<BudgetCategory>;

    async fn deactivate_category(&self, family_id: &str, category_id: &str) -> Result<()>;

    /// Assigns `sort_order` 0..n following `ordered_ids`.
    async fn reorder_categories(
        &self,
        family_id: &str,
        ordered_ids: Vec<String>,
    ) -> Result<Vec<BudgetCategory>>;

    /// Replaces every allocation of the income event with `lines`.
    async fn replace_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
        lines: Vec<AllocationLine>,
    ) -> Result<Vec<BudgetAllocation>>;

    fn list_allocations(&self, family_id: &str, income_event_id: &str)
        -> Result<Vec<BudgetAllocation>>;

    /// Allocations of income events whose effective date lies in the range.
    fn list_allocations_between(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BudgetAllocation>>;
}

#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    fn list_categories(&self, family_id: &str, include_inactive: bool)
        -> Result<Vec<BudgetCategory>>;

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory>;

    async fn create_category(
        &self,
        family_id: &str,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory>;

    async fn update_category(
        &self,
        family_id: &str,
        category_id: &str,
        update: BudgetCategoryUpdate,
    ) -> Result<BudgetCategory>;

    /// Soft delete: the category is deactivated so past allocations survive.
    async fn delete_category(&self, family_id: &str, category_id: &str) -> Result<()>;

    async fn reorder_categories(
        &self,
        family_id: &str,
        ordered_ids: Vec<String>,
    ) -> Result<Vec<BudgetCategory>>;

    fn percentage_summary(&self, family_id: &str) -> Result<PercentageSummary>;

    async fn generate_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<BudgetAllocation>>;

    fn list_allocations(&self, family_id: &str, income_event_id: &str)
        -> Result<Vec<BudgetAllocation>>;

    fn budget_performance(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BudgetPerformance>;
}

use async_trait::async_trait;
use chrono::NaiveDate;

use super::income_model::{
    IncomeEvent, IncomeEventUpdate, IncomeFilter, IncomeTransition, MarkReceived, NewIncomeEvent,
};
use crate::errors::Result;

/// Persistence contract for income events.
///
/// Returned events carry their derived `allocated_amount`. Implementations
/// run `check_income_update`, `check_income_delete` and
/// `plan_income_transition` inside the write transaction.
#[async_trait]
pub trait IncomeRepositoryTrait: Send + Sync {
    /// Ordered by scheduled date, oldest first.
    fn list(&self, family_id: &str, filter: &IncomeFilter) -> Result<Vec<IncomeEvent>>;

    fn get(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent>;

    async fn create(&self, family_id: &str, income: NewIncomeEvent) -> Result<IncomeEvent>;

    async fn create_many(
        &self,
        family_id: &str,
        incomes: Vec<NewIncomeEvent>,
    ) -> Result<Vec<IncomeEvent>>;

    async fn update(
        &self,
        family_id: &str,
        income_id: &str,
        update: IncomeEventUpdate,
    ) -> Result<IncomeEvent>;

    async fn delete(&self, family_id: &str, income_id: &str) -> Result<()>;

    async fn transition(
        &self,
        family_id: &str,
        income_id: &str,
        transition: IncomeTransition,
    ) -> Result<IncomeEvent>;
}

#[async_trait]
pub trait IncomeServiceTrait: Send + Sync {
    fn list_income_events(&self, family_id: &str, filter: IncomeFilter)
        -> Result<Vec<IncomeEvent>>;

    fn get_income_event(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent>;

    async fn create_income_event(
        &self,
        family_id: &str,
        income: NewIncomeEvent,
    ) -> Result<IncomeEvent>;

    async fn update_income_event(
        &self,
        family_id: &str,
        income_id: &str,
        update: IncomeEventUpdate,
    ) -> Result<IncomeEvent>;

    async fn delete_income_event(&self, family_id: &str, income_id: &str) -> Result<()>;

    /// `today` is the family's local date, used when no actual date is given.
    async fn mark_received(
        &self,
        family_id: &str,
        income_id: &str,
        request: MarkReceived,
        today: NaiveDate,
    ) -> Result<IncomeEvent>;

    async fn revert_received(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent>;

    async fn cancel_income_event(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent>;

    /// Creates the next `occurrences` scheduled copies of a recurring event.
    async fn generate_recurring(
        &self,
        family_id: &str,
        income_id: &str,
        occurrences: u32,
    ) -> Result<Vec<IncomeEvent>>;

    /// Scheduled events dated within `days` of `today`.
    fn upcoming_income(
        &self,
        family_id: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<IncomeEvent>>;
}

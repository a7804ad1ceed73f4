use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use log::{debug, info};
use std::sync::Arc;

use super::income_model::{
    IncomeEvent, IncomeEventUpdate, IncomeFilter, IncomeStatus, IncomeTransition, MarkReceived,
    NewIncomeEvent,
};
use super::income_traits::{IncomeRepositoryTrait, IncomeServiceTrait};
use crate::constants::MAX_RECURRING_OCCURRENCES;
use crate::errors::{Error, Result};

pub struct IncomeService {
    repository: Arc<dyn IncomeRepositoryTrait>,
}

impl IncomeService {
    pub fn new(repository: Arc<dyn IncomeRepositoryTrait>) -> Self {
        Self { repository }
    }
}

/// Builds the scheduled copies following `event` in its series.
pub fn recurring_copies(event: &IncomeEvent, occurrences: u32) -> Result<Vec<NewIncomeEvent>> {
    if !event.frequency.is_recurring() {
        return Err(Error::invalid_input(
            "Only recurring income events can generate future occurrences",
        ));
    }
    if occurrences == 0 || occurrences > MAX_RECURRING_OCCURRENCES {
        return Err(Error::invalid_input(format!(
            "Occurrences must be between 1 and {}",
            MAX_RECURRING_OCCURRENCES
        )));
    }
    (1..=occurrences)
        .map(|step| {
            let scheduled_date = event
                .frequency
                .advance(event.scheduled_date, step)
                .ok_or_else(|| Error::invalid_input("Recurring date is out of range"))?;
            Ok(NewIncomeEvent {
                name: event.name.clone(),
                source: event.source.clone(),
                amount: event.amount,
                scheduled_date,
                frequency: event.frequency,
                notes: event.notes.clone(),
            })
        })
        .collect()
}

#[async_trait]
impl IncomeServiceTrait for IncomeService {
    fn list_income_events(
        &self,
        family_id: &str,
        filter: IncomeFilter,
    ) -> Result<Vec<IncomeEvent>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(Error::invalid_input("startDate must not be after endDate"));
            }
        }
        self.repository.list(family_id, &filter)
    }

    fn get_income_event(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent> {
        self.repository.get(family_id, income_id)
    }

    async fn create_income_event(
        &self,
        family_id: &str,
        income: NewIncomeEvent,
    ) -> Result<IncomeEvent> {
        income.validate()?;
        let created = self.repository.create(family_id, income).await?;
        debug!("Created income event {} for family {}", created.id, family_id);
        Ok(created)
    }

    async fn update_income_event(
        &self,
        family_id: &str,
        income_id: &str,
        update: IncomeEventUpdate,
    ) -> Result<IncomeEvent> {
        update.validate()?;
        self.repository.update(family_id, income_id, update).await
    }

    async fn delete_income_event(&self, family_id: &str, income_id: &str) -> Result<()> {
        self.repository.delete(family_id, income_id).await?;
        info!("Deleted income event {} of family {}", income_id, family_id);
        Ok(())
    }

    async fn mark_received(
        &self,
        family_id: &str,
        income_id: &str,
        request: MarkReceived,
        today: NaiveDate,
    ) -> Result<IncomeEvent> {
        let transition = IncomeTransition::Receive {
            actual_date: request.actual_date.unwrap_or(today),
            actual_amount: request.actual_amount,
        };
        let received = self
            .repository
            .transition(family_id, income_id, transition)
            .await?;
        info!(
            "Income event {} received ({:?})",
            income_id, received.actual_amount
        );
        Ok(received)
    }

    async fn revert_received(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent> {
        self.repository
            .transition(family_id, income_id, IncomeTransition::Revert)
            .await
    }

    async fn cancel_income_event(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent> {
        self.repository
            .transition(family_id, income_id, IncomeTransition::Cancel)
            .await
    }

    async fn generate_recurring(
        &self,
        family_id: &str,
        income_id: &str,
        occurrences: u32,
    ) -> Result<Vec<IncomeEvent>> {
        let event = self.repository.get(family_id, income_id)?;
        let copies = recurring_copies(&event, occurrences)?;
        let created = self.repository.create_many(family_id, copies).await?;
        info!(
            "Generated {} occurrences of income event {}",
            created.len(),
            income_id
        );
        Ok(created)
    }

    fn upcoming_income(
        &self,
        family_id: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<IncomeEvent>> {
        let end_date = today
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| Error::invalid_input("days is out of range"))?;
        self.repository.list(
            family_id,
            &IncomeFilter {
                status: Some(IncomeStatus::Scheduled),
                start_date: Some(today),
                end_date: Some(end_date),
                ..Default::default()
            },
        )
    }
}

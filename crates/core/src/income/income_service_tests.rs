use super::*;
use crate::errors::{Error, Result};
use crate::schedule::Frequency;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory repository; `allocated` simulates attributions drawn from events.
#[derive(Default)]
struct MockIncomeRepository {
    events: Mutex<Vec<IncomeEvent>>,
    attribution_count: Mutex<usize>,
}

impl MockIncomeRepository {
    fn insert(&self, family_id: &str, income: NewIncomeEvent) -> IncomeEvent {
        let now = Utc::now().naive_utc();
        let event = IncomeEvent {
            id: uuid::Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            name: income.name,
            source: income.source,
            amount: income.amount,
            scheduled_date: income.scheduled_date,
            frequency: income.frequency,
            status: IncomeStatus::Scheduled,
            actual_date: None,
            actual_amount: None,
            notes: income.notes,
            allocated_amount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
        .with_allocated(Decimal::ZERO);
        self.events.lock().unwrap().push(event.clone());
        event
    }

    fn set_allocated(&self, income_id: &str, allocated: Decimal) {
        let mut events = self.events.lock().unwrap();
        if let Some(event) = events.iter_mut().find(|e| e.id == income_id) {
            *event = event.clone().with_allocated(allocated);
        }
        *self.attribution_count.lock().unwrap() = usize::from(allocated > Decimal::ZERO);
    }
}

#[async_trait]
impl IncomeRepositoryTrait for MockIncomeRepository {
    fn list(&self, family_id: &str, filter: &IncomeFilter) -> Result<Vec<IncomeEvent>> {
        let mut events: Vec<IncomeEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.family_id == family_id)
            .filter(|e| filter.status.map_or(true, |s| e.status == s))
            .filter(|e| filter.start_date.map_or(true, |d| e.scheduled_date >= d))
            .filter(|e| filter.end_date.map_or(true, |d| e.scheduled_date <= d))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.scheduled_date);
        Ok(events)
    }

    fn get(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == income_id && e.family_id == family_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Income event", income_id))
    }

    async fn create(&self, family_id: &str, income: NewIncomeEvent) -> Result<IncomeEvent> {
        Ok(self.insert(family_id, income))
    }

    async fn create_many(
        &self,
        family_id: &str,
        incomes: Vec<NewIncomeEvent>,
    ) -> Result<Vec<IncomeEvent>> {
        Ok(incomes
            .into_iter()
            .map(|income| self.insert(family_id, income))
            .collect())
    }

    async fn update(
        &self,
        family_id: &str,
        income_id: &str,
        update: IncomeEventUpdate,
    ) -> Result<IncomeEvent> {
        let current = self.get(family_id, income_id)?;
        check_income_update(&current, &update)?;
        let updated = IncomeEvent {
            amount: update.amount.unwrap_or(current.amount),
            notes: update.notes.or(current.notes.clone()),
            ..current.clone()
        }
        .with_allocated(current.allocated_amount);
        let mut events = self.events.lock().unwrap();
        if let Some(slot) = events.iter_mut().find(|e| e.id == income_id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    async fn delete(&self, family_id: &str, income_id: &str) -> Result<()> {
        let current = self.get(family_id, income_id)?;
        check_income_delete(&current, *self.attribution_count.lock().unwrap())?;
        self.events.lock().unwrap().retain(|e| e.id != income_id);
        Ok(())
    }

    async fn transition(
        &self,
        family_id: &str,
        income_id: &str,
        transition: IncomeTransition,
    ) -> Result<IncomeEvent> {
        let current = self.get(family_id, income_id)?;
        let patch = plan_income_transition(
            &current,
            *self.attribution_count.lock().unwrap(),
            &transition,
        )?;
        let updated = IncomeEvent {
            status: patch.status,
            actual_date: patch.actual_date,
            actual_amount: patch.actual_amount,
            ..current.clone()
        }
        .with_allocated(current.allocated_amount);
        let mut events = self.events.lock().unwrap();
        if let Some(slot) = events.iter_mut().find(|e| e.id == income_id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }
}

fn paycheck(frequency: Frequency) -> NewIncomeEvent {
    NewIncomeEvent {
        name: "Paycheck".to_string(),
        source: Some("Acme Corp".to_string()),
        amount: dec!(2500.00),
        scheduled_date: date(2024, 1, 31),
        frequency,
        notes: None,
    }
}

fn service() -> (Arc<MockIncomeRepository>, IncomeService) {
    let repo = Arc::new(MockIncomeRepository::default());
    (repo.clone(), IncomeService::new(repo))
}

#[tokio::test]
async fn create_rejects_non_positive_amount() {
    let (_, service) = service();
    let mut income = paycheck(Frequency::Once);
    income.amount = dec!(0);
    let err = service
        .create_income_event("fam", income)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn receiving_twice_is_a_conflict() {
    let (_, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();

    let received = service
        .mark_received(
            "fam",
            &event.id,
            MarkReceived {
                actual_date: None,
                actual_amount: Some(dec!(2450.00)),
            },
            date(2024, 2, 1),
        )
        .await
        .unwrap();
    assert_eq!(received.status, IncomeStatus::Received);
    assert_eq!(received.actual_date, Some(date(2024, 2, 1)));
    assert_eq!(received.effective_amount(), dec!(2450.00));
    assert_eq!(received.remaining_amount, dec!(2450.00));

    let err = service
        .mark_received("fam", &event.id, MarkReceived::default(), date(2024, 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn received_amount_cannot_drop_below_attributions() {
    let (repo, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();
    repo.set_allocated(&event.id, dec!(2000));

    let err = service
        .mark_received(
            "fam",
            &event.id,
            MarkReceived {
                actual_date: None,
                actual_amount: Some(dec!(1999.99)),
            },
            date(2024, 2, 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let err = service
        .update_income_event(
            "fam",
            &event.id,
            IncomeEventUpdate {
                amount: Some(dec!(100)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn delete_and_cancel_blocked_by_attributions() {
    let (repo, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();
    repo.set_allocated(&event.id, dec!(10));

    assert!(matches!(
        service.delete_income_event("fam", &event.id).await.unwrap_err(),
        Error::Conflict(_)
    ));
    assert!(matches!(
        service.cancel_income_event("fam", &event.id).await.unwrap_err(),
        Error::Conflict(_)
    ));

    repo.set_allocated(&event.id, dec!(0));
    let cancelled = service.cancel_income_event("fam", &event.id).await.unwrap();
    assert_eq!(cancelled.status, IncomeStatus::Cancelled);
}

#[tokio::test]
async fn received_events_only_accept_note_changes() {
    let (_, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();
    service
        .mark_received("fam", &event.id, MarkReceived::default(), date(2024, 1, 31))
        .await
        .unwrap();

    let err = service
        .update_income_event(
            "fam",
            &event.id,
            IncomeEventUpdate {
                amount: Some(dec!(3000)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let updated = service
        .update_income_event(
            "fam",
            &event.id,
            IncomeEventUpdate {
                notes: Some("bonus included".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("bonus included"));

    let reverted = service.revert_received("fam", &event.id).await.unwrap();
    assert_eq!(reverted.status, IncomeStatus::Scheduled);
    assert_eq!(reverted.actual_amount, None);
}

#[tokio::test]
async fn generate_recurring_steps_from_anchor() {
    let (_, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Monthly))
        .await
        .unwrap();

    let created = service
        .generate_recurring("fam", &event.id, 3)
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = created.iter().map(|e| e.scheduled_date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
    );
    assert!(created.iter().all(|e| e.status == IncomeStatus::Scheduled));
}

#[tokio::test]
async fn generate_recurring_validates_input() {
    let (_, service) = service();
    let once = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();
    let monthly = service
        .create_income_event("fam", paycheck(Frequency::Monthly))
        .await
        .unwrap();

    for (id, n) in [(&once.id, 1), (&monthly.id, 0), (&monthly.id, 53)] {
        let err = service.generate_recurring("fam", id, n).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}

#[tokio::test]
async fn upcoming_only_lists_scheduled_events_in_window() {
    let (_, service) = service();
    let mut soon = paycheck(Frequency::Once);
    soon.scheduled_date = date(2024, 3, 10);
    let mut later = paycheck(Frequency::Once);
    later.scheduled_date = date(2024, 4, 10);
    service.create_income_event("fam", soon).await.unwrap();
    service.create_income_event("fam", later).await.unwrap();

    let upcoming = service
        .upcoming_income("fam", date(2024, 3, 1), 14)
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].scheduled_date, date(2024, 3, 10));
}

#[tokio::test]
async fn other_families_see_not_found() {
    let (_, service) = service();
    let event = service
        .create_income_event("fam", paycheck(Frequency::Once))
        .await
        .unwrap();
    let err = service.get_income_event("other", &event.id).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

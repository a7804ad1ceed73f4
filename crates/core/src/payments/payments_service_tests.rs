use super::*;
use crate::budget::{
    AllocationLine, BudgetAllocation, BudgetCategory, BudgetCategoryUpdate, BudgetRepositoryTrait,
    NewBudgetCategory,
};
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

// ============================================================================
// Mock Implementations
// ============================================================================

#[derive(Default)]
struct MockPaymentRepository {
    payments: Mutex<Vec<Payment>>,
}

impl MockPaymentRepository {
    fn insert(&self, family_id: &str, payment: NewPayment) -> Payment {
        let now = Utc::now().naive_utc();
        let mut payments = self.payments.lock().unwrap();
        let created = Payment {
            id: format!("pay-{}", payments.len() + 1),
            family_id: family_id.to_string(),
            payee: payment.payee,
            amount: payment.amount,
            due_date: payment.due_date,
            frequency: payment.frequency,
            status: PaymentStatus::Scheduled,
            paid_date: None,
            paid_amount: None,
            budget_category_id: payment.budget_category_id,
            auto_pay: payment.auto_pay,
            notes: payment.notes,
            attributed_amount: Decimal::ZERO,
            remaining_amount: payment.amount,
            created_at: now,
            updated_at: now,
        };
        payments.push(created.clone());
        created
    }

    fn store(&self, payment: &Payment) {
        let mut payments = self.payments.lock().unwrap();
        if let Some(slot) = payments.iter_mut().find(|p| p.id == payment.id) {
            *slot = payment.clone();
        }
    }
}

#[async_trait]
impl PaymentRepositoryTrait for MockPaymentRepository {
    fn list(&self, family_id: &str, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.family_id == family_id)
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| filter.start_date.map_or(true, |d| p.due_date >= d))
            .filter(|p| filter.end_date.map_or(true, |d| p.due_date <= d))
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.due_date);
        Ok(payments)
    }

    fn get(&self, family_id: &str, payment_id: &str) -> Result<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.family_id == family_id && p.id == payment_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Payment", payment_id))
    }

    async fn create(&self, family_id: &str, payment: NewPayment) -> Result<Payment> {
        Ok(self.insert(family_id, payment))
    }

    async fn update(
        &self,
        family_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
        today: NaiveDate,
    ) -> Result<Payment> {
        let mut payment = self.get(family_id, payment_id)?;
        check_payment_update(&payment, &update)?;
        if let Some(due_date) = update.due_date {
            payment.due_date = due_date;
        }
        payment.status = PaymentStatus::open_for(payment.due_date, today);
        if let Some(amount) = update.amount {
            let attributed = payment.attributed_amount;
            payment = Payment { amount, ..payment }.with_attributed(attributed);
        }
        if let Some(category) = update.budget_category_id {
            payment.budget_category_id = category;
        }
        self.store(&payment);
        Ok(payment)
    }

    async fn delete(&self, family_id: &str, payment_id: &str) -> Result<()> {
        self.get(family_id, payment_id)?;
        self.payments.lock().unwrap().retain(|p| p.id != payment_id);
        Ok(())
    }

    async fn transition(
        &self,
        family_id: &str,
        payment_id: &str,
        transition: PaymentTransition,
    ) -> Result<PaymentTransitionOutcome> {
        let current = self.get(family_id, payment_id)?;
        let patch = plan_payment_transition(&current, &transition)?;
        let payment = Payment {
            status: patch.status,
            paid_date: patch.paid_date,
            paid_amount: patch.paid_amount,
            ..current
        };
        self.store(&payment);
        let next = match transition {
            PaymentTransition::Pay { .. } => {
                next_occurrence(&payment).map(|next| self.insert(family_id, next))
            }
            _ => None,
        };
        Ok(PaymentTransitionOutcome { payment, next })
    }

    async fn mark_overdue(&self, family_id: &str, today: NaiveDate) -> Result<usize> {
        let mut count = 0;
        for payment in self.payments.lock().unwrap().iter_mut() {
            if payment.family_id == family_id
                && payment.status.is_open()
                && payment.status != PaymentStatus::open_for(payment.due_date, today)
            {
                payment.status = PaymentStatus::open_for(payment.due_date, today);
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Knows a single active category, "housing".
struct StubBudgetRepository;

#[async_trait]
impl BudgetRepositoryTrait for StubBudgetRepository {
    fn list_categories(&self, _: &str, _: bool) -> Result<Vec<BudgetCategory>> {
        unimplemented!()
    }

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory> {
        if category_id != "housing" {
            return Err(Error::not_found("Budget category", category_id));
        }
        let now = Utc::now().naive_utc();
        Ok(BudgetCategory {
            id: category_id.to_string(),
            family_id: family_id.to_string(),
            name: "Housing".to_string(),
            target_percentage: dec!(30),
            color: None,
            sort_order: 0,
            is_active: true,
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

fn rent(frequency: Frequency) -> NewPayment {
    NewPayment {
        payee: "Landlord".to_string(),
        amount: dec!(1500),
        due_date: date(2024, 1, 31),
        frequency,
        budget_category_id: Some("housing".to_string()),
        auto_pay: true,
        notes: None,
    }
}

fn service() -> (Arc<MockPaymentRepository>, PaymentService) {
    let repo = Arc::new(MockPaymentRepository::default());
    (
        repo.clone(),
        PaymentService::new(repo, Arc::new(StubBudgetRepository)),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn create_validates_payee_amount_and_category() {
    let (_, service) = service();

    let mut blank = rent(Frequency::Once);
    blank.payee = "  ".to_string();
    assert!(matches!(
        service.create_payment("fam", blank).await.unwrap_err(),
        Error::Validation(_)
    ));

    let mut negative = rent(Frequency::Once);
    negative.amount = dec!(-1);
    assert!(matches!(
        service.create_payment("fam", negative).await.unwrap_err(),
        Error::Validation(_)
    ));

    let mut unknown_category = rent(Frequency::Once);
    unknown_category.budget_category_id = Some("nope".to_string());
    assert!(matches!(
        service.create_payment("fam", unknown_category).await.unwrap_err(),
        Error::Validation(_)
    ));

    let mut daily = rent(Frequency::Daily);
    daily.budget_category_id = None;
    assert!(matches!(
        service.create_payment("fam", daily).await.unwrap_err(),
        Error::Validation(_)
    ));
}

#[tokio::test]
async fn paying_recurring_payment_schedules_next_occurrence() {
    let (_, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Monthly))
        .await
        .unwrap();

    let outcome = service
        .mark_paid("fam", &payment.id, MarkPaid::default(), date(2024, 1, 30))
        .await
        .unwrap();
    assert_eq!(outcome.payment.status, PaymentStatus::Paid);
    assert_eq!(outcome.payment.paid_date, Some(date(2024, 1, 30)));
    assert_eq!(outcome.payment.paid_amount, Some(dec!(1500)));

    let next = outcome.next.expect("next occurrence");
    assert_eq!(next.due_date, date(2024, 2, 29));
    assert_eq!(next.status, PaymentStatus::Scheduled);
    assert_eq!(next.budget_category_id.as_deref(), Some("housing"));
}

#[tokio::test]
async fn paying_twice_conflicts_and_one_off_has_no_successor() {
    let (_, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Once))
        .await
        .unwrap();

    let outcome = service
        .mark_paid(
            "fam",
            &payment.id,
            MarkPaid {
                paid_date: Some(date(2024, 1, 29)),
                paid_amount: Some(dec!(1490)),
            },
            date(2024, 2, 1),
        )
        .await
        .unwrap();
    assert!(outcome.next.is_none());
    assert_eq!(outcome.payment.paid_amount, Some(dec!(1490)));

    let err = service
        .mark_paid("fam", &payment.id, MarkPaid::default(), date(2024, 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn paid_payments_are_locked_until_reverted() {
    let (_, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Once))
        .await
        .unwrap();
    service
        .mark_paid("fam", &payment.id, MarkPaid::default(), date(2024, 1, 31))
        .await
        .unwrap();

    let update = PaymentUpdate {
        amount: Some(dec!(1600)),
        ..Default::default()
    };
    assert!(matches!(
        service
            .update_payment("fam", &payment.id, update.clone(), date(2024, 2, 1))
            .await
            .unwrap_err(),
        Error::Conflict(_)
    ));

    // reverting after the due date lands in OVERDUE
    let reverted = service
        .revert_paid("fam", &payment.id, date(2024, 2, 5))
        .await
        .unwrap();
    assert_eq!(reverted.status, PaymentStatus::Overdue);
    assert_eq!(reverted.paid_date, None);

    let updated = service
        .update_payment("fam", &payment.id, update, date(2024, 2, 5))
        .await
        .unwrap();
    assert_eq!(updated.amount, dec!(1600));
}

#[tokio::test]
async fn amount_cannot_drop_below_attributed() {
    let (repo, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Once))
        .await
        .unwrap();
    repo.store(&payment.clone().with_attributed(dec!(1000)));

    let err = service
        .update_payment(
            "fam",
            &payment.id,
            PaymentUpdate {
                amount: Some(dec!(999.99)),
                ..Default::default()
            },
            date(2024, 1, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn cancel_rules() {
    let (_, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Once))
        .await
        .unwrap();
    let cancelled = service.cancel_payment("fam", &payment.id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    assert!(matches!(
        service.cancel_payment("fam", &payment.id).await.unwrap_err(),
        Error::Conflict(_)
    ));
    assert!(matches!(
        service
            .mark_paid("fam", &payment.id, MarkPaid::default(), date(2024, 2, 1))
            .await
            .unwrap_err(),
        Error::Conflict(_)
    ));
}

#[tokio::test]
async fn overdue_sweep_and_listings() {
    let (_, service) = service();
    let mut early = rent(Frequency::Once);
    early.due_date = date(2024, 3, 1);
    let mut soon = rent(Frequency::Once);
    soon.due_date = date(2024, 3, 12);
    let mut far = rent(Frequency::Once);
    far.due_date = date(2024, 6, 1);
    for payment in [early, soon, far] {
        service.create_payment("fam", payment).await.unwrap();
    }

    let today = date(2024, 3, 5);
    assert_eq!(service.mark_overdue("fam", today).await.unwrap(), 1);
    assert_eq!(service.mark_overdue("fam", today).await.unwrap(), 0);

    let overdue = service.overdue_payments("fam").unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].due_date, date(2024, 3, 1));

    let upcoming = service.upcoming_payments("fam", today, 14).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].due_date, date(2024, 3, 12));
}

#[tokio::test]
async fn rescheduled_overdue_payment_is_upcoming_again() {
    let (_, service) = service();
    let payment = service
        .create_payment("fam", rent(Frequency::Once))
        .await
        .unwrap();
    let today = date(2024, 2, 3);
    service.mark_overdue("fam", today).await.unwrap();
    assert_eq!(service.overdue_payments("fam").unwrap().len(), 1);

    let moved = service
        .update_payment(
            "fam",
            &payment.id,
            PaymentUpdate {
                due_date: Some(date(2024, 2, 10)),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(moved.status, PaymentStatus::Scheduled);
    assert!(service.overdue_payments("fam").unwrap().is_empty());
    assert_eq!(service.upcoming_payments("fam", today, 14).unwrap().len(), 1);
}

#[test]
fn update_can_clear_category_with_null() {
    let update: PaymentUpdate = serde_json::from_str(r#"{"budgetCategoryId": null}"#).unwrap();
    assert_eq!(update.budget_category_id, Some(None));
    let update: PaymentUpdate = serde_json::from_str(r#"{}"#).unwrap();
    assert_eq!(update.budget_category_id, None);
}

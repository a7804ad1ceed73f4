use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use log::{debug, info};
use std::sync::Arc;

use super::payments_model::{
    MarkPaid, NewPayment, Payment, PaymentFilter, PaymentStatus, PaymentTransition,
    PaymentTransitionOutcome, PaymentUpdate,
};
use super::payments_traits::{PaymentRepositoryTrait, PaymentServiceTrait};
use crate::budget::{ensure_active_category, BudgetRepositoryTrait};
use crate::errors::{Error, Result};

pub struct PaymentService {
    repository: Arc<dyn PaymentRepositoryTrait>,
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
}

impl PaymentService {
    pub fn new(
        repository: Arc<dyn PaymentRepositoryTrait>,
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            budget_repository,
        }
    }
}

#[async_trait]
impl PaymentServiceTrait for PaymentService {
    fn list_payments(&self, family_id: &str, filter: PaymentFilter) -> Result<Vec<Payment>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(Error::invalid_input("startDate must not be after endDate"));
            }
        }
        self.repository.list(family_id, &filter)
    }

    fn get_payment(&self, family_id: &str, payment_id: &str) -> Result<Payment> {
        self.repository.get(family_id, payment_id)
    }

    async fn create_payment(&self, family_id: &str, payment: NewPayment) -> Result<Payment> {
        payment.validate()?;
        if let Some(category_id) = &payment.budget_category_id {
            ensure_active_category(self.budget_repository.as_ref(), family_id, category_id)?;
        }
        let created = self.repository.create(family_id, payment).await?;
        debug!("Created payment {} for family {}", created.id, family_id);
        Ok(created)
    }

    async fn update_payment(
        &self,
        family_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
        today: NaiveDate,
    ) -> Result<Payment> {
        update.validate()?;
        if let Some(Some(category_id)) = &update.budget_category_id {
            ensure_active_category(self.budget_repository.as_ref(), family_id, category_id)?;
        }
        self.repository
            .update(family_id, payment_id, update, today)
            .await
    }

    async fn delete_payment(&self, family_id: &str, payment_id: &str) -> Result<()> {
        self.repository.delete(family_id, payment_id).await?;
        info!("Deleted payment {} of family {}", payment_id, family_id);
        Ok(())
    }

    async fn mark_paid(
        &self,
        family_id: &str,
        payment_id: &str,
        request: MarkPaid,
        today: NaiveDate,
    ) -> Result<PaymentTransitionOutcome> {
        let outcome = self
            .repository
            .transition(
                family_id,
                payment_id,
                PaymentTransition::Pay {
                    paid_date: request.paid_date.unwrap_or(today),
                    paid_amount: request.paid_amount,
                },
            )
            .await?;
        match &outcome.next {
            Some(next) => info!(
                "Payment {} paid; next occurrence {} due {}",
                payment_id, next.id, next.due_date
            ),
            None => info!("Payment {} paid", payment_id),
        }
        Ok(outcome)
    }

    async fn revert_paid(
        &self,
        family_id: &str,
        payment_id: &str,
        today: NaiveDate,
    ) -> Result<Payment> {
        let outcome = self
            .repository
            .transition(family_id, payment_id, PaymentTransition::Revert { today })
            .await?;
        Ok(outcome.payment)
    }

    async fn cancel_payment(&self, family_id: &str, payment_id: &str) -> Result<Payment> {
        let outcome = self
            .repository
            .transition(family_id, payment_id, PaymentTransition::Cancel)
            .await?;
        Ok(outcome.payment)
    }

    async fn mark_overdue(&self, family_id: &str, today: NaiveDate) -> Result<usize> {
        let count = self.repository.mark_overdue(family_id, today).await?;
        if count > 0 {
            info!("Marked {} payment(s) overdue for family {}", count, family_id);
        }
        Ok(count)
    }

    fn upcoming_payments(
        &self,
        family_id: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<Payment>> {
        let end_date = today
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| Error::invalid_input("days is out of range"))?;
        self.repository.list(
            family_id,
            &PaymentFilter {
                status: Some(PaymentStatus::Scheduled),
                start_date: Some(today),
                end_date: Some(end_date),
                ..Default::default()
            },
        )
    }

    fn overdue_payments(&self, family_id: &str) -> Result<Vec<Payment>> {
        self.repository.list(
            family_id,
            &PaymentFilter {
                status: Some(PaymentStatus::Overdue),
                ..Default::default()
            },
        )
    }
}

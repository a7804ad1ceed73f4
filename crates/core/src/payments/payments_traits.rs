use async_trait::async_trait;
use chrono::NaiveDate;

use super::payments_model::{
    MarkPaid, NewPayment, Payment, PaymentFilter, PaymentTransition, PaymentTransitionOutcome,
    PaymentUpdate,
};
use crate::errors::Result;

/// Persistence contract for payments.
///
/// Returned payments carry their derived `attributed_amount`. Status changes
/// and updates are validated with `plan_payment_transition` and
/// `check_payment_update` inside the write transaction.
#[async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    /// Ordered by due date, oldest first.
    fn list(&self, family_id: &str, filter: &PaymentFilter) -> Result<Vec<Payment>>;

    fn get(&self, family_id: &str, payment_id: &str) -> Result<Payment>;

    async fn create(&self, family_id: &str, payment: NewPayment) -> Result<Payment>;

    /// Re-derives SCHEDULED or OVERDUE from the resulting due date.
    async fn update(
        &self,
        family_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
        today: NaiveDate,
    ) -> Result<Payment>;

    /// Deletes the payment together with its attributions.
    async fn delete(&self, family_id: &str, payment_id: &str) -> Result<()>;

    /// Applies a status change. Paying a recurring payment also inserts its
    /// next occurrence in the same transaction.
    async fn transition(
        &self,
        family_id: &str,
        payment_id: &str,
        transition: PaymentTransition,
    ) -> Result<PaymentTransitionOutcome>;

    /// Flags SCHEDULED payments due before `today` as OVERDUE and moves
    /// OVERDUE ones no longer past due back to SCHEDULED. Returns the number
    /// of payments changed.
    async fn mark_overdue(&self, family_id: &str, today: NaiveDate) -> Result<usize>;
}

#[async_trait]
pub trait PaymentServiceTrait: Send + Sync {
    fn list_payments(&self, family_id: &str, filter: PaymentFilter) -> Result<Vec<Payment>>;

    fn get_payment(&self, family_id: &str, payment_id: &str) -> Result<Payment>;

    async fn create_payment(&self, family_id: &str, payment: NewPayment) -> Result<Payment>;

    async fn update_payment(
        &self,
        family_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
        today: NaiveDate,
    ) -> Result<Payment>;

    async fn delete_payment(&self, family_id: &str, payment_id: &str) -> Result<()>;

    async fn mark_paid(
        &self,
        family_id: &str,
        payment_id: &str,
        request: MarkPaid,
        today: NaiveDate,
    ) -> Result<PaymentTransitionOutcome>;

    async fn revert_paid(
        &self,
        family_id: &str,
        payment_id: &str,
        today: NaiveDate,
    ) -> Result<Payment>;

    async fn cancel_payment(&self, family_id: &str, payment_id: &str) -> Result<Payment>;

    async fn mark_overdue(&self, family_id: &str, today: NaiveDate) -> Result<usize>;

    fn upcoming_payments(&self, family_id: &str, today: NaiveDate, days: u32)
        -> Result<Vec<Payment>>;

    fn overdue_payments(&self, family_id: &str) -> Result<Vec<Payment>>;
}

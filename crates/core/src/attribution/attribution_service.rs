use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::attribution_model::{
    AttributionType, FundingSummary, IncomeBalanceSummary, NewAttribution, PaymentAttribution,
};
use super::attribution_traits::{AttributionRepositoryTrait, AttributionServiceTrait};
use crate::errors::{Error, Result};
use crate::income::IncomeRepositoryTrait;
use crate::payments::{PaymentRepositoryTrait, PaymentStatus};
use crate::utils::require_positive_amount;

pub struct AttributionService {
    repository: Arc<dyn AttributionRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    income_repository: Arc<dyn IncomeRepositoryTrait>,
}

impl AttributionService {
    pub fn new(
        repository: Arc<dyn AttributionRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        income_repository: Arc<dyn IncomeRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            payment_repository,
            income_repository,
        }
    }
}

#[async_trait]
impl AttributionServiceTrait for AttributionService {
    fn list_payment_attributions(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        self.payment_repository.get(family_id, payment_id)?;
        self.repository.list_for_payment(family_id, payment_id)
    }

    fn list_income_attributions(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        self.income_repository.get(family_id, income_event_id)?;
        self.repository.list_for_income(family_id, income_event_id)
    }

    async fn create_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution: NewAttribution,
    ) -> Result<PaymentAttribution> {
        require_positive_amount("Attribution amount", attribution.amount)?;
        if attribution.income_event_id.trim().is_empty() {
            return Err(Error::invalid_input("incomeEventId is required"));
        }
        let created = self
            .repository
            .create(family_id, payment_id, attribution, AttributionType::Manual)
            .await?;
        debug!(
            "Attributed {} of income {} to payment {}",
            created.amount, created.income_event_id, payment_id
        );
        Ok(created)
    }

    async fn update_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
        amount: Decimal,
    ) -> Result<PaymentAttribution> {
        require_positive_amount("Attribution amount", amount)?;
        self.repository
            .update(family_id, payment_id, attribution_id, amount)
            .await
    }

    async fn delete_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
    ) -> Result<()> {
        self.repository
            .delete(family_id, payment_id, attribution_id)
            .await
    }

    async fn auto_attribute(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        let payment = self.payment_repository.get(family_id, payment_id)?;
        if payment.status == PaymentStatus::Cancelled {
            return Err(Error::Conflict(
                "Cancelled payments cannot be funded".to_string(),
            ));
        }
        if payment.remaining_amount <= Decimal::ZERO {
            debug!("Payment {} is already fully funded", payment_id);
            return Ok(Vec::new());
        }
        let changed = self.repository.auto_attribute(family_id, payment_id).await?;
        info!(
            "Auto-attributed payment {} from {} income event(s)",
            payment_id,
            changed.len()
        );
        Ok(changed)
    }

    fn payment_funding(&self, family_id: &str, payment_id: &str) -> Result<FundingSummary> {
        let payment = self.payment_repository.get(family_id, payment_id)?;
        let attributions = self.repository.list_for_payment(family_id, payment_id)?;
        Ok(FundingSummary {
            payment_id: payment.id,
            amount: payment.amount,
            attributed: payment.attributed_amount,
            remaining: payment.remaining_amount,
            is_fully_funded: payment.remaining_amount <= Decimal::ZERO,
            attributions,
        })
    }

    fn income_balance(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<IncomeBalanceSummary> {
        let income = self.income_repository.get(family_id, income_event_id)?;
        Ok(IncomeBalanceSummary {
            amount: income.effective_amount(),
            allocated: income.allocated_amount,
            remaining: income.remaining_amount,
            income_event_id: income.id,
        })
    }
}

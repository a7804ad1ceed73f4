use async_trait::async_trait;
use rust_decimal::Decimal;

use super::attribution_model::{
    AttributionType, FundingSummary, IncomeBalanceSummary, NewAttribution, PaymentAttribution,
};
use crate::errors::Result;

/// Persistence contract for attributions.
///
/// Every write loads the payment and income event, sums their existing
/// attributions and runs the ledger checks inside one write transaction.
#[async_trait]
pub trait AttributionRepositoryTrait: Send + Sync {
    fn list_for_payment(&self, family_id: &str, payment_id: &str)
        -> Result<Vec<PaymentAttribution>>;

    fn list_for_income(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<PaymentAttribution>>;

    /// A second attribution for the same payment and income pair is a conflict.
    async fn create(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution: NewAttribution,
        attribution_type: AttributionType,
    ) -> Result<PaymentAttribution>;

    async fn update(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
        amount: Decimal,
    ) -> Result<PaymentAttribution>;

    async fn delete(&self, family_id: &str, payment_id: &str, attribution_id: &str)
        -> Result<()>;

    /// Funds the payment's unfunded amount from the family's income events
    /// using `order_auto_candidates` and `plan_auto_attribution`. Draws from
    /// an income event already linked to the payment increase that
    /// attribution. Returns the attributions created or changed.
    async fn auto_attribute(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>>;
}

#[async_trait]
pub trait AttributionServiceTrait: Send + Sync {
    fn list_payment_attributions(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>>;

    fn list_income_attributions(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<PaymentAttribution>>;

    async fn create_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution: NewAttribution,
    ) -> Result<PaymentAttribution>;

    async fn update_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
        amount: Decimal,
    ) -> Result<PaymentAttribution>;

    async fn delete_attribution(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
    ) -> Result<()>;

    async fn auto_attribute(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>>;

    fn payment_funding(&self, family_id: &str, payment_id: &str) -> Result<FundingSummary>;

    fn income_balance(&self, family_id: &str, income_event_id: &str)
        -> Result<IncomeBalanceSummary>;
}

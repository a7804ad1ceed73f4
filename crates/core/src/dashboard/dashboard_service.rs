use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::dashboard_model::DashboardSummary;
use crate::bank::{BankAccount, BankAccountServiceTrait, TransactionRepositoryTrait};
use crate::budget::{BudgetServiceTrait, PercentageSummary};
use crate::constants::DASHBOARD_UPCOMING_DAYS;
use crate::errors::Result;
use crate::income::{IncomeEvent, IncomeServiceTrait};
use crate::payments::{Payment, PaymentServiceTrait};
use crate::reports::build_net_worth;
use crate::utils::{first_of_month, sum_amounts};

pub trait DashboardServiceTrait: Send + Sync {
    /// `today` is the family's local date.
    fn summary(&self, family_id: &str, today: NaiveDate) -> Result<DashboardSummary>;
}

/// Inputs of [`build_summary`], already scoped to one family.
pub struct DashboardInputs {
    pub accounts: Vec<BankAccount>,
    pub upcoming_payments: Vec<Payment>,
    pub upcoming_income: Vec<IncomeEvent>,
    pub overdue_payments: Vec<Payment>,
    pub budget: PercentageSummary,
    pub month_to_date_spending: Decimal,
}

pub fn build_summary(today: NaiveDate, inputs: DashboardInputs) -> DashboardSummary {
    let net_worth = build_net_worth(&inputs.accounts);
    DashboardSummary {
        as_of: today,
        total_balance: net_worth.assets,
        net_worth: net_worth.net_worth,
        upcoming_payments_total: sum_amounts(inputs.upcoming_payments.iter().map(|p| p.amount)),
        upcoming_payments: inputs.upcoming_payments,
        upcoming_income_total: sum_amounts(inputs.upcoming_income.iter().map(|i| i.amount)),
        upcoming_income: inputs.upcoming_income,
        overdue_payment_count: inputs.overdue_payments.len(),
        overdue_payment_total: sum_amounts(inputs.overdue_payments.iter().map(|p| p.amount)),
        budget: inputs.budget,
        month_to_date_spending: inputs.month_to_date_spending,
    }
}

pub struct DashboardService {
    account_service: Arc<dyn BankAccountServiceTrait>,
    payment_service: Arc<dyn PaymentServiceTrait>,
    income_service: Arc<dyn IncomeServiceTrait>,
    budget_service: Arc<dyn BudgetServiceTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
}

impl DashboardService {
    pub fn new(
        account_service: Arc<dyn BankAccountServiceTrait>,
        payment_service: Arc<dyn PaymentServiceTrait>,
        income_service: Arc<dyn IncomeServiceTrait>,
        budget_service: Arc<dyn BudgetServiceTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    ) -> Self {
        Self {
            account_service,
            payment_service,
            income_service,
            budget_service,
            transaction_repository,
        }
    }
}

impl DashboardServiceTrait for DashboardService {
    fn summary(&self, family_id: &str, today: NaiveDate) -> Result<DashboardSummary> {
        debug!("Building dashboard for family {} as of {}", family_id, today);
        let spending = self.transaction_repository.spending_by_category(
            family_id,
            first_of_month(today),
            today,
        )?;
        let inputs = DashboardInputs {
            accounts: self.account_service.list_accounts(family_id, false)?,
            upcoming_payments: self.payment_service.upcoming_payments(
                family_id,
                today,
                DASHBOARD_UPCOMING_DAYS,
            )?,
            upcoming_income: self.income_service.upcoming_income(
                family_id,
                today,
                DASHBOARD_UPCOMING_DAYS,
            )?,
            overdue_payments: self.payment_service.overdue_payments(family_id)?,
            budget: self.budget_service.percentage_summary(family_id)?,
            month_to_date_spending: sum_amounts(spending.into_values()),
        };
        Ok(build_summary(today, inputs))
    }
}

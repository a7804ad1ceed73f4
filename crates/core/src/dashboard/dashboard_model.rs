use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::PercentageSummary;
use crate::income::IncomeEvent;
use crate::payments::Payment;

/// Household overview for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    /// Current balance of active asset accounts.
    pub total_balance: Decimal,
    pub net_worth: Decimal,
    pub upcoming_payments: Vec<Payment>,
    pub upcoming_payments_total: Decimal,
    pub upcoming_income: Vec<IncomeEvent>,
    pub upcoming_income_total: Decimal,
    pub overdue_payment_count: usize,
    pub overdue_payment_total: Decimal,
    pub budget: PercentageSummary,
    pub month_to_date_spending: Decimal,
}

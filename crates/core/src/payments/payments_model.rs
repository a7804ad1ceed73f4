//! Payment models and status rules.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::schedule::Frequency;
use crate::utils::{double_option, require_positive_amount};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Scheduled,
    Paid,
    Overdue,
    Cancelled,
}

string_enum!(PaymentStatus, "payment status", {
    Scheduled => "SCHEDULED",
    Paid => "PAID",
    Overdue => "OVERDUE",
    Cancelled => "CANCELLED",
});

impl PaymentStatus {
    /// Still expected to be paid.
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentStatus::Scheduled | PaymentStatus::Overdue)
    }

    /// Status of an unpaid payment as seen on `today`.
    pub fn open_for(due_date: NaiveDate, today: NaiveDate) -> PaymentStatus {
        if due_date < today {
            PaymentStatus::Overdue
        } else {
            PaymentStatus::Scheduled
        }
    }
}

/// A scheduled or completed outflow of money.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub family_id: String,
    pub payee: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub frequency: Frequency,
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
    pub budget_category_id: Option<String>,
    pub auto_pay: bool,
    pub notes: Option<String>,
    /// Sum of the income attributions funding this payment.
    pub attributed_amount: Decimal,
    pub remaining_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Payment {
    pub fn with_attributed(mut self, attributed: Decimal) -> Self {
        self.attributed_amount = attributed;
        self.remaining_amount = self.amount - attributed;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub payee: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub frequency: Frequency,
    pub budget_category_id: Option<String>,
    #[serde(default)]
    pub auto_pay: bool,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<()> {
        if self.payee.trim().is_empty() {
            return Err(Error::invalid_input("Payee cannot be empty"));
        }
        require_positive_amount("Payment amount", self.amount)?;
        self.frequency.validate_for_cash_flow()
    }
}

/// Partial update. `budgetCategoryId: null` clears the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payee: Option<String>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    #[serde(default, deserialize_with = "double_option")]
    pub budget_category_id: Option<Option<String>>,
    pub auto_pay: Option<bool>,
    pub notes: Option<String>,
}

impl PaymentUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(payee) = &self.payee {
            if payee.trim().is_empty() {
                return Err(Error::invalid_input("Payee cannot be empty"));
            }
        }
        if let Some(amount) = self.amount {
            require_positive_amount("Payment amount", amount)?;
        }
        if let Some(frequency) = &self.frequency {
            frequency.validate_for_cash_flow()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_category_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaid {
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentTransition {
    Pay {
        paid_date: NaiveDate,
        paid_amount: Option<Decimal>,
    },
    /// `today` decides between SCHEDULED and OVERDUE.
    Revert { today: NaiveDate },
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusPatch {
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
}

/// Result of a status change. `next` is the follow-up occurrence created
/// when a recurring payment is paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransitionOutcome {
    pub payment: Payment,
    pub next: Option<Payment>,
}

pub fn check_payment_update(current: &Payment, update: &PaymentUpdate) -> Result<()> {
    match current.status {
        PaymentStatus::Paid => {
            return Err(Error::Conflict(
                "Paid payments cannot be modified; revert the payment first".to_string(),
            ))
        }
        PaymentStatus::Cancelled => {
            return Err(Error::Conflict(
                "Cancelled payments cannot be modified".to_string(),
            ))
        }
        _ => {}
    }
    if let Some(amount) = update.amount {
        if amount < current.attributed_amount {
            return Err(Error::Conflict(format!(
                "Payment amount {} is below the {} already attributed from income",
                amount, current.attributed_amount
            )));
        }
    }
    Ok(())
}

pub fn plan_payment_transition(
    current: &Payment,
    transition: &PaymentTransition,
) -> Result<PaymentStatusPatch> {
    match transition {
        PaymentTransition::Pay {
            paid_date,
            paid_amount,
        } => {
            match current.status {
                PaymentStatus::Paid => {
                    return Err(Error::Conflict("Payment has already been paid".to_string()))
                }
                PaymentStatus::Cancelled => {
                    return Err(Error::Conflict(
                        "A cancelled payment cannot be paid".to_string(),
                    ))
                }
                _ => {}
            }
            let amount = paid_amount.unwrap_or(current.amount);
            require_positive_amount("Paid amount", amount)?;
            Ok(PaymentStatusPatch {
                status: PaymentStatus::Paid,
                paid_date: Some(*paid_date),
                paid_amount: Some(amount),
            })
        }
        PaymentTransition::Revert { today } => {
            if current.status != PaymentStatus::Paid {
                return Err(Error::Conflict(
                    "Only paid payments can be reverted".to_string(),
                ));
            }
            Ok(PaymentStatusPatch {
                status: PaymentStatus::open_for(current.due_date, *today),
                paid_date: None,
                paid_amount: None,
            })
        }
        PaymentTransition::Cancel => {
            if !current.status.is_open() {
                return Err(Error::Conflict(format!(
                    "Payment is {} and cannot be cancelled",
                    current.status.as_str().to_lowercase()
                )));
            }
            Ok(PaymentStatusPatch {
                status: PaymentStatus::Cancelled,
                paid_date: None,
                paid_amount: None,
            })
        }
    }
}

/// The next occurrence of a recurring payment, due one period later.
pub fn next_occurrence(payment: &Payment) -> Option<NewPayment> {
    let due_date = payment.frequency.next_after(payment.due_date)?;
    Some(NewPayment {
        payee: payment.payee.clone(),
        amount: payment.amount,
        due_date,
        frequency: payment.frequency,
        budget_category_id: payment.budget_category_id.clone(),
        auto_pay: payment.auto_pay,
        notes: payment.notes.clone(),
    })
}

//! Income event models and status rules.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::schedule::Frequency;
use crate::utils::require_positive_amount;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeStatus {
    #[default]
    Scheduled,
    Received,
    Cancelled,
}

string_enum!(IncomeStatus, "income status", {
    Scheduled => "SCHEDULED",
    Received => "RECEIVED",
    Cancelled => "CANCELLED",
});

/// A scheduled or received inflow of money.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEvent {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub source: Option<String>,
    pub amount: Decimal,
    pub scheduled_date: NaiveDate,
    pub frequency: Frequency,
    pub status: IncomeStatus,
    pub actual_date: Option<NaiveDate>,
    pub actual_amount: Option<Decimal>,
    pub notes: Option<String>,
    /// Sum of the payment attributions drawn from this event.
    pub allocated_amount: Decimal,
    pub remaining_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl IncomeEvent {
    /// The amount attributions may draw from: the actual amount once received.
    pub fn effective_amount(&self) -> Decimal {
        match (self.status, self.actual_amount) {
            (IncomeStatus::Received, Some(actual)) => actual,
            _ => self.amount,
        }
    }

    pub fn effective_date(&self) -> NaiveDate {
        match (self.status, self.actual_date) {
            (IncomeStatus::Received, Some(actual)) => actual,
            _ => self.scheduled_date,
        }
    }

    /// Fills the derived balance fields.
    pub fn with_allocated(mut self, allocated: Decimal) -> Self {
        self.allocated_amount = allocated;
        self.remaining_amount = self.effective_amount() - allocated;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncomeEvent {
    pub name: String,
    pub source: Option<String>,
    pub amount: Decimal,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub frequency: Frequency,
    pub notes: Option<String>,
}

impl NewIncomeEvent {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Income name cannot be empty"));
        }
        require_positive_amount("Income amount", self.amount)?;
        self.frequency.validate_for_cash_flow()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEventUpdate {
    pub name: Option<String>,
    pub source: Option<String>,
    pub amount: Option<Decimal>,
    pub scheduled_date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    pub notes: Option<String>,
}

impl IncomeEventUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::invalid_input("Income name cannot be empty"));
            }
        }
        if let Some(amount) = self.amount {
            require_positive_amount("Income amount", amount)?;
        }
        if let Some(frequency) = &self.frequency {
            frequency.validate_for_cash_flow()?;
        }
        Ok(())
    }

    fn changes_schedule(&self) -> bool {
        self.name.is_some()
            || self.amount.is_some()
            || self.scheduled_date.is_some()
            || self.frequency.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeFilter {
    pub status: Option<IncomeStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReceived {
    pub actual_date: Option<NaiveDate>,
    pub actual_amount: Option<Decimal>,
}

/// A requested status change, resolved against the current row.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomeTransition {
    Receive {
        actual_date: NaiveDate,
        actual_amount: Option<Decimal>,
    },
    Revert,
    Cancel,
}

/// Column values written by a status change.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeStatusPatch {
    pub status: IncomeStatus,
    pub actual_date: Option<NaiveDate>,
    pub actual_amount: Option<Decimal>,
}

/// Received events only accept note and source edits; amounts may never drop
/// below what payments already draw.
pub fn check_income_update(current: &IncomeEvent, update: &IncomeEventUpdate) -> Result<()> {
    if current.status != IncomeStatus::Scheduled && update.changes_schedule() {
        return Err(Error::Conflict(format!(
            "Income event is {}; only notes and source can be changed",
            current.status.as_str().to_lowercase()
        )));
    }
    if let Some(amount) = update.amount {
        if amount < current.allocated_amount {
            return Err(Error::Conflict(format!(
                "Income amount {} is below the {} already attributed to payments",
                amount, current.allocated_amount
            )));
        }
    }
    Ok(())
}

pub fn check_income_delete(current: &IncomeEvent, attribution_count: usize) -> Result<()> {
    if attribution_count > 0 {
        return Err(Error::Conflict(format!(
            "Income event '{}' funds {} payment attribution(s); remove them first",
            current.name, attribution_count
        )));
    }
    Ok(())
}

/// Computes the new status columns, enforcing the state rules.
pub fn plan_income_transition(
    current: &IncomeEvent,
    attribution_count: usize,
    transition: &IncomeTransition,
) -> Result<IncomeStatusPatch> {
    match transition {
        IncomeTransition::Receive {
            actual_date,
            actual_amount,
        } => {
            match current.status {
                IncomeStatus::Received => {
                    return Err(Error::Conflict(
                        "Income event has already been received".to_string(),
                    ))
                }
                IncomeStatus::Cancelled => {
                    return Err(Error::Conflict(
                        "A cancelled income event cannot be received".to_string(),
                    ))
                }
                IncomeStatus::Scheduled => {}
            }
            let amount = actual_amount.unwrap_or(current.amount);
            require_positive_amount("Actual amount", amount)?;
            if amount < current.allocated_amount {
                return Err(Error::Conflict(format!(
                    "Actual amount {} is below the {} already attributed to payments",
                    amount, current.allocated_amount
                )));
            }
            Ok(IncomeStatusPatch {
                status: IncomeStatus::Received,
                actual_date: Some(*actual_date),
                actual_amount: Some(amount),
            })
        }
        IncomeTransition::Revert => {
            if current.status != IncomeStatus::Received {
                return Err(Error::Conflict(
                    "Only received income events can be reverted".to_string(),
                ));
            }
            if current.amount < current.allocated_amount {
                return Err(Error::Conflict(format!(
                    "Scheduled amount {} is below the {} already attributed to payments",
                    current.amount, current.allocated_amount
                )));
            }
            Ok(IncomeStatusPatch {
                status: IncomeStatus::Scheduled,
                actual_date: None,
                actual_amount: None,
            })
        }
        IncomeTransition::Cancel => {
            if current.status != IncomeStatus::Scheduled {
                return Err(Error::Conflict(format!(
                    "Income event is {} and cannot be cancelled",
                    current.status.as_str().to_lowercase()
                )));
            }
            if attribution_count > 0 {
                return Err(Error::Conflict(
                    "Income event funds payments; remove the attributions first".to_string(),
                ));
            }
            Ok(IncomeStatusPatch {
                status: IncomeStatus::Cancelled,
                actual_date: None,
                actual_amount: None,
            })
        }
    }
}

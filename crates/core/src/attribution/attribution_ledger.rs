//! Funding arithmetic between payments and income events.
//!
//! A payment may never be attributed more than its amount and an income
//! event may never fund more than its (actual, once received) amount.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::attribution_model::{IncomeBalance, PlannedDraw};
use crate::errors::{Error, Result};
use crate::income::{IncomeEvent, IncomeStatus};
use crate::payments::{Payment, PaymentStatus};
use crate::utils::require_positive_amount;

pub fn check_new_attribution(
    payment_amount: Decimal,
    payment_attributed: Decimal,
    income_amount: Decimal,
    income_allocated: Decimal,
    amount: Decimal,
) -> Result<()> {
    require_positive_amount("Attribution amount", amount)?;
    let payment_remaining = payment_amount - payment_attributed;
    if amount > payment_remaining {
        return Err(Error::Conflict(format!(
            "Attribution of {} exceeds the payment's unfunded amount of {}",
            amount, payment_remaining
        )));
    }
    let income_remaining = income_amount - income_allocated;
    if amount > income_remaining {
        return Err(Error::Conflict(format!(
            "Attribution of {} exceeds the income event's remaining {}",
            amount, income_remaining
        )));
    }
    Ok(())
}

/// Same rules as [`check_new_attribution`], with the attribution's previous
/// amount released from both sides first.
pub fn check_attribution_update(
    payment_amount: Decimal,
    payment_attributed: Decimal,
    income_amount: Decimal,
    income_allocated: Decimal,
    previous: Decimal,
    amount: Decimal,
) -> Result<()> {
    check_new_attribution(
        payment_amount,
        payment_attributed - previous,
        income_amount,
        income_allocated - previous,
        amount,
    )
}

/// Status rules for linking a payment to an income event.
pub fn check_attribution_link(payment: &Payment, income: &IncomeEvent) -> Result<()> {
    if payment.status == PaymentStatus::Cancelled {
        return Err(Error::Conflict(
            "Cancelled payments cannot be funded".to_string(),
        ));
    }
    if income.status == IncomeStatus::Cancelled {
        return Err(Error::Conflict(
            "Cancelled income events cannot fund payments".to_string(),
        ));
    }
    Ok(())
}

/// Candidates for funding a payment due on `due_date`: open income events
/// with money left, those dated on or before the due date first (oldest
/// first), then later ones.
pub fn order_auto_candidates(
    due_date: NaiveDate,
    incomes: &[IncomeEvent],
) -> Vec<IncomeBalance> {
    let mut candidates: Vec<IncomeBalance> = incomes
        .iter()
        .filter(|i| i.status != IncomeStatus::Cancelled && i.remaining_amount > Decimal::ZERO)
        .map(|i| IncomeBalance {
            income_event_id: i.id.clone(),
            date: i.effective_date(),
            remaining: i.remaining_amount,
        })
        .collect();
    candidates.sort_by(|a, b| {
        (a.date > due_date, a.date, &a.income_event_id).cmp(&(
            b.date > due_date,
            b.date,
            &b.income_event_id,
        ))
    });
    candidates
}

/// Greedily draws `needed` from the candidates in order.
pub fn plan_auto_attribution(needed: Decimal, candidates: &[IncomeBalance]) -> Vec<PlannedDraw> {
    let mut outstanding = needed;
    let mut draws = Vec::new();
    for candidate in candidates {
        if outstanding <= Decimal::ZERO {
            break;
        }
        if candidate.remaining <= Decimal::ZERO {
            continue;
        }
        let amount = outstanding.min(candidate.remaining);
        draws.push(PlannedDraw {
            income_event_id: candidate.income_event_id.clone(),
            amount,
        });
        outstanding -= amount;
    }
    draws
}

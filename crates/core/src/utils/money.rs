//! Money helpers shared by the budget, attribution and report code.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{CURRENCY_PRECISION, MAX_AMOUNT, PERCENTAGE_PRECISION};
use crate::errors::{Error, Result};

/// Rounds an amount to currency precision, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates an amount to currency precision (toward zero).
pub fn truncate_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::ToZero)
}

pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENTAGE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, or zero when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_percentage(part / whole * Decimal::ONE_HUNDRED)
}

/// Ensures a money amount is strictly positive, within `MAX_AMOUNT` and has
/// at most two decimals.
pub fn require_positive_amount(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "{} must be greater than zero",
            field
        )));
    }
    require_amount_within_limit(field, amount)
}

/// Signed variant used for balances and transactions.
pub fn require_amount_within_limit(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.abs() > MAX_AMOUNT {
        return Err(Error::invalid_input(format!(
            "{} cannot exceed {}",
            field, MAX_AMOUNT
        )));
    }
    if amount.normalize().scale() > CURRENCY_PRECISION {
        return Err(Error::invalid_input(format!(
            "{} cannot have more than {} decimal places",
            field, CURRENCY_PRECISION
        )));
    }
    Ok(amount)
}

/// Sums an iterator of amounts, saturating instead of overflowing.
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Lossy conversion used for ratios in report payloads.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

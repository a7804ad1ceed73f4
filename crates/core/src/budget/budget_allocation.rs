//! Percentage validation and income allocation arithmetic.
//!
//! Everything here is pure; repositories call these functions inside their
//! write transactions so the checks see a consistent snapshot.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::budget_model::{
    AllocationLine, BudgetAllocation, BudgetCategory, BudgetCategoryUpdate, BudgetPerformance,
    CategoryPerformance, NewBudgetCategory, PercentageSummary,
};
use crate::constants::{MAX_TOTAL_PERCENTAGE, PERCENTAGE_PRECISION};
use crate::errors::{Error, Result};
use crate::utils::{percent_of, round_currency, sum_amounts, truncate_currency};

const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Checks a candidate percentage against the other active categories.
///
/// Returns the total the family would have after accepting the candidate.
pub fn validate_category_percentages(
    existing_active: &[Decimal],
    candidate: Decimal,
) -> Result<Decimal> {
    if candidate <= Decimal::ZERO || candidate > MAX_TOTAL_PERCENTAGE {
        return Err(Error::invalid_input(format!(
            "Percentage must be greater than 0 and at most 100 (got {})",
            candidate
        )));
    }
    if candidate.normalize().scale() > PERCENTAGE_PRECISION {
        return Err(Error::invalid_input(format!(
            "Percentage cannot have more than {} decimal places",
            PERCENTAGE_PRECISION
        )));
    }
    let total = sum_amounts(existing_active.iter().copied()) + candidate;
    if total > MAX_TOTAL_PERCENTAGE {
        return Err(Error::Conflict(format!(
            "Budget category percentages would total {}%, which exceeds 100%",
            total.normalize()
        )));
    }
    Ok(total)
}

/// Rejects a name already used by another active category (case-insensitive).
pub fn ensure_unique_category_name<'a, I>(existing_names: I, candidate: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = candidate.trim().to_lowercase();
    if existing_names
        .into_iter()
        .any(|name| name.trim().to_lowercase() == wanted)
    {
        return Err(Error::Conflict(format!(
            "A budget category named '{}' already exists",
            candidate.trim()
        )));
    }
    Ok(())
}

pub fn summarize_percentages(categories: &[BudgetCategory]) -> PercentageSummary {
    let active: Vec<&BudgetCategory> = categories.iter().filter(|c| c.is_active).collect();
    let total = sum_amounts(active.iter().map(|c| c.target_percentage));
    PercentageSummary {
        total_percentage: total,
        remaining_percentage: (MAX_TOTAL_PERCENTAGE - total).max(Decimal::ZERO),
        is_fully_allocated: total == MAX_TOTAL_PERCENTAGE,
        category_count: active.len(),
    }
}

/// Splits `amount` across categories by percentage.
///
/// Each share is truncated to cents; the cents still missing to reach
/// `round(amount * total% / 100)` go one at a time to the shares with the
/// largest truncated remainders, earlier categories winning ties. The lines
/// therefore sum exactly to the rounded target and never exceed `amount`
/// while the percentages total at most 100. Amounts too large to multiply
/// are a validation error.
pub fn allocate_income(
    amount: Decimal,
    categories: &[(String, Decimal)],
) -> Result<Vec<AllocationLine>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    let total_percentage = sum_amounts(categories.iter().map(|(_, pct)| *pct));
    let target = round_currency(share_of(amount, total_percentage)?);

    let mut lines = Vec::with_capacity(categories.len());
    let mut remainders = Vec::with_capacity(categories.len());
    for (index, (category_id, percentage)) in categories.iter().enumerate() {
        let exact = share_of(amount, *percentage)?;
        let base = truncate_currency(exact);
        remainders.push((index, exact - base));
        lines.push(AllocationLine {
            budget_category_id: category_id.clone(),
            percentage: *percentage,
            amount: base,
        });
    }

    let mut leftover = target - sum_amounts(lines.iter().map(|l| l.amount));
    // Stable sort keeps input order among equal remainders.
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    let mut cursor = 0;
    while leftover >= CENT {
        let (index, _) = remainders[cursor % remainders.len()];
        lines[index].amount += CENT;
        leftover -= CENT;
        cursor += 1;
    }

    Ok(lines)
}

fn share_of(amount: Decimal, percentage: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(percentage)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| Error::invalid_input(format!("Amount {} is too large to allocate", amount)))
}

/// Builds the allocated-versus-spent view.
///
/// `spent_by_category` maps a category id (or `None` for uncategorized) to
/// the outflow total in the range.
pub fn build_performance(
    start_date: NaiveDate,
    end_date: NaiveDate,
    categories: &[BudgetCategory],
    allocations: &[BudgetAllocation],
    spent_by_category: &HashMap<Option<String>, Decimal>,
) -> BudgetPerformance {
    let mut allocated_by_category: HashMap<&str, Decimal> = HashMap::new();
    for allocation in allocations {
        let total = allocated_by_category
            .entry(allocation.budget_category_id.as_str())
            .or_insert(Decimal::ZERO);
        *total = total.saturating_add(allocation.amount);
    }

    let rows: Vec<CategoryPerformance> = categories
        .iter()
        .filter(|c| c.is_active)
        .map(|category| {
            let allocated = allocated_by_category
                .get(category.id.as_str())
                .copied()
                .unwrap_or(Decimal::ZERO);
            let spent = spent_by_category
                .get(&Some(category.id.clone()))
                .copied()
                .unwrap_or(Decimal::ZERO);
            CategoryPerformance {
                budget_category_id: category.id.clone(),
                name: category.name.clone(),
                color: category.color.clone(),
                target_percentage: category.target_percentage,
                allocated,
                spent,
                remaining: allocated - spent,
                percent_used: percent_of(spent, allocated),
                is_over_budget: spent > allocated,
            }
        })
        .collect();

    BudgetPerformance {
        start_date,
        end_date,
        total_allocated: sum_amounts(rows.iter().map(|r| r.allocated)),
        total_spent: sum_amounts(spent_by_category.values().copied()),
        uncategorized_spent: spent_by_category.get(&None).copied().unwrap_or(Decimal::ZERO),
        categories: rows,
    }
}

/// Rules for inserting a category, given the family's active categories.
pub fn check_new_category(active: &[BudgetCategory], new: &NewBudgetCategory) -> Result<()> {
    ensure_unique_category_name(active.iter().map(|c| c.name.as_str()), &new.name)?;
    let percentages: Vec<Decimal> = active.iter().map(|c| c.target_percentage).collect();
    validate_category_percentages(&percentages, new.target_percentage)?;
    Ok(())
}

/// Rules for updating `current`, given the family's other active categories.
///
/// Percentage and name are only re-checked when the category ends up active.
pub fn check_category_update(
    current: &BudgetCategory,
    other_active: &[BudgetCategory],
    update: &BudgetCategoryUpdate,
) -> Result<()> {
    let will_be_active = update.is_active.unwrap_or(current.is_active);
    if !will_be_active {
        return Ok(());
    }
    let name = update.name.as_deref().unwrap_or(&current.name);
    ensure_unique_category_name(
        other_active
            .iter()
            .filter(|c| c.id != current.id)
            .map(|c| c.name.as_str()),
        name,
    )?;
    let percentages: Vec<Decimal> = other_active
        .iter()
        .filter(|c| c.id != current.id)
        .map(|c| c.target_percentage)
        .collect();
    validate_category_percentages(
        &percentages,
        update.target_percentage.unwrap_or(current.target_percentage),
    )?;
    Ok(())
}

//! Budget category and allocation models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A named percentage slice of income (e.g. "Needs" at 50%).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub target_percentage: Decimal,
    pub color: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetCategory {
    pub name: String,
    pub target_percentage: Decimal,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
}

impl NewBudgetCategory {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_color(self.color.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoryUpdate {
    pub name: Option<String>,
    pub target_percentage: Option<Decimal>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

impl BudgetCategoryUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_color(self.color.as_deref())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input("Budget category name cannot be empty"));
    }
    if name.chars().count() > 64 {
        return Err(Error::invalid_input(
            "Budget category name cannot exceed 64 characters",
        ));
    }
    Ok(())
}

fn validate_color(color: Option<&str>) -> Result<()> {
    if let Some(color) = color {
        let hex = color.strip_prefix('#').unwrap_or("");
        if !(hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())) {
            return Err(Error::invalid_input(format!(
                "Color '{}' must look like #RRGGBB",
                color
            )));
        }
    }
    Ok(())
}

/// Totals of the active category percentages of a family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PercentageSummary {
    pub total_percentage: Decimal,
    pub remaining_percentage: Decimal,
    pub is_fully_allocated: bool,
    pub category_count: usize,
}

/// One computed share of an income amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLine {
    pub budget_category_id: String,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// A persisted share of an income event assigned to a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAllocation {
    pub id: String,
    pub family_id: String,
    pub income_event_id: String,
    pub budget_category_id: String,
    pub percentage: Decimal,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub budget_category_id: String,
    pub name: String,
    pub color: Option<String>,
    pub target_percentage: Decimal,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub is_over_budget: bool,
}

/// Allocated versus spent per category over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPerformance {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: Vec<CategoryPerformance>,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub uncategorized_spent: Decimal,
}

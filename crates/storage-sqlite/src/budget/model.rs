//! Database models for budget categories and allocations.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use kgiq_core::budget::{BudgetAllocation, BudgetCategory};

use crate::utils::parse_decimal;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::budget_categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetCategoryDB {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub target_percentage: String,
    pub color: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(BudgetCategoryDB, foreign_key = budget_category_id))]
#[diesel(table_name = crate::schema::budget_allocations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetAllocationDB {
    pub id: String,
    pub family_id: String,
    pub income_event_id: String,
    pub budget_category_id: String,
    pub percentage: String,
    pub amount: String,
    pub created_at: NaiveDateTime,
}

impl From<BudgetCategoryDB> for BudgetCategory {
    fn from(db: BudgetCategoryDB) -> Self {
        Self {
            target_percentage: parse_decimal(&db.target_percentage, "target_percentage"),
            id: db.id,
            family_id: db.family_id,
            name: db.name,
            color: db.color,
            sort_order: db.sort_order,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<BudgetAllocationDB> for BudgetAllocation {
    fn from(db: BudgetAllocationDB) -> Self {
        Self {
            percentage: parse_decimal(&db.percentage, "percentage"),
            amount: parse_decimal(&db.amount, "amount"),
            id: db.id,
            family_id: db.family_id,
            income_event_id: db.income_event_id,
            budget_category_id: db.budget_category_id,
            created_at: db.created_at,
        }
    }
}

//! Budget categories, percentage rules and income allocation.

mod budget_allocation;
mod budget_model;
mod budget_service;
mod budget_traits;


pub use budget_allocation::{
    allocate_income, build_performance, check_category_update, check_new_category,
    ensure_unique_category_name, summarize_percentages, validate_category_percentages,
};
pub use budget_model::*;
pub use budget_service::{ensure_active_category, BudgetService};
pub use budget_traits::{BudgetRepositoryTrait, BudgetServiceTrait};

//! SQLite storage implementation for budget categories and allocations.

mod model;
mod repository;

pub use model::{BudgetAllocationDB, BudgetCategoryDB};
pub use repository::BudgetRepository;

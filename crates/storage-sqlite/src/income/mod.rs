//! SQLite storage implementation for income events.

mod model;
mod repository;

pub use model::IncomeEventDB;
pub(crate) use repository::{load_income, load_open_incomes};
pub use repository::IncomeRepository;

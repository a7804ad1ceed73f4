//! Income events: scheduled and received inflows.

mod income_model;
mod income_service;
mod income_traits;

#[cfg(test)]
mod income_service_tests;

pub use income_model::*;
pub use income_service::{recurring_copies, IncomeService};
pub use income_traits::{IncomeRepositoryTrait, IncomeServiceTrait};

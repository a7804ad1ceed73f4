//! Payment attributions: which income events fund which payments.

mod attribution_ledger;
mod attribution_model;
mod attribution_service;
mod attribution_traits;


pub use attribution_ledger::*;
pub use attribution_model::*;
pub use attribution_service::AttributionService;
pub use attribution_traits::{AttributionRepositoryTrait, AttributionServiceTrait};

//! Payments: scheduled and completed outflows.

mod payments_model;
mod payments_service;
mod payments_traits;

#[cfg(test)]
mod payments_service_tests;

pub use payments_model::*;
pub use payments_service::PaymentService;
pub use payments_traits::{PaymentRepositoryTrait, PaymentServiceTrait};

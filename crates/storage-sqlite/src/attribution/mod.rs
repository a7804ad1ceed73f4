//! SQLite storage implementation for payment attributions.

mod model;
mod repository;

pub use model::PaymentAttributionDB;
pub use repository::AttributionRepository;

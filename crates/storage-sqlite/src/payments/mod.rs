//! SQLite storage implementation for payments.

mod model;
mod repository;

pub use model::PaymentDB;
pub(crate) use repository::load_payment;
pub use repository::PaymentRepository;

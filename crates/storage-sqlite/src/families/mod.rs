//! SQLite storage implementation for families and members.

mod model;
mod repository;

pub use model::{FamilyDB, FamilyMemberDB};
pub use repository::FamilyRepository;

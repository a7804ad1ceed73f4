//! Families module - households, members and authentication.

mod auth_service;
mod families_model;
mod families_service;
mod families_traits;


// Re-export the public interface
pub use auth_service::{AuthService, AuthServiceTrait, RegisterRequest};
pub use families_model::*;
pub use families_service::FamilyService;
pub use families_traits::{FamilyRepositoryTrait, FamilyServiceTrait, PasswordHasherTrait};

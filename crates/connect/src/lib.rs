//! KGiQ Connect - bank data aggregation through Plaid.
//!
//! This crate provides the HTTP client the server uses to link institutions
//! and pull account balances and transactions. It implements the core
//! [`BankDataProvider`](kgiq_core::bank::BankDataProvider) trait so the sync
//! service never talks to Plaid directly.

mod client;
mod mapping;
mod models;

pub use client::{PlaidClient, PlaidConfig, PlaidEnvironment, DEFAULT_CLIENT_NAME};

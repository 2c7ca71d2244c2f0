//! WAI Common Library
//!
//! Shared types, constants, and utilities for the WAI basket vault and its
//! collaborators.
//!
//! ## Contents
//!
//! - **Fixed-point math**: 256-bit intermediates, truncation toward zero
//! - **Errors**: one stable error enum for every rejected call
//! - **Events**: audit trail of registry and issuance changes
//! - **Configuration**: per-basket accounts and fee schedule
//! - **Interfaces**: price oracle, asset ledger and share token traits
//! - **In-memory ledger**: reference `AssetLedger` for embedding and tests

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod ledger;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use config::VaultConfig;
pub use errors::*;
pub use events::*;
pub use interfaces::*;
pub use ledger::InMemoryLedger;
pub use types::*;

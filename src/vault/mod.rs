//! Vault module — the credential store and authentication engine.
//!
//! This module provides:
//! - `Vault`, owning the database connection and the process cipher (`store`)
//! - user registration and two-factor login (`registry`)
//! - encrypted per-service credentials with upsert writes (`ledger`)
//! - `Session`, `WriteOutcome` and `ServiceCredential` value types (`credential`)
//! - the SQLite schema (`schema`)

pub mod credential;
pub mod ledger;
pub mod registry;
pub mod schema;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{ServiceCredential, Session, WriteOutcome};
pub use store::{Vault, VaultOptions, IN_MEMORY};

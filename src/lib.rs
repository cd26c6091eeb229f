pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod vault;

pub use errors::{CredVaultError, ErrorKind, Result};
pub use vault::{ServiceCredential, Session, Vault, VaultOptions, WriteOutcome};

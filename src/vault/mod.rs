//! Vault module — durable credential storage.
//!
//! This module provides:
//! - The `Credential` record type (`credential`)
//! - SQLite-backed `CredentialStore` (`store`)
//! - `VaultManager`, the add/get contract used by the CLI (`manager`)

pub mod credential;
pub mod manager;
pub mod store;

// Re-export the most commonly used items.
pub use credential::Credential;
pub use manager::VaultManager;
pub use store::CredentialStore;

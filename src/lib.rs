pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod vault;

pub use errors::{PassVaultError, Result};
pub use vault::VaultManager;

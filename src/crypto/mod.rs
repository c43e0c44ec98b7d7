//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - Master key generation and the key file (`keystore`)
//! - AES-256-GCM encryption of single secret values (`cipher`)

pub mod cipher;
pub mod keystore;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{KeyStore, VaultCipher, ...};
pub use cipher::{EncryptedPayload, VaultCipher, PAYLOAD_VERSION};
pub use keystore::{KeyStore, MasterKey, KEY_LEN};

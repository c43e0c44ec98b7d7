//! High-level add/get operations used by the CLI.
//!
//! `VaultManager` owns a `VaultCipher` and a `CredentialStore` and wires
//! them together so callers deal only in plaintext:
//! `manager.add("email", "alice", "Secr3t!23")`.

use std::path::Path;

use crate::config::Settings;
use crate::crypto::{KeyStore, VaultCipher};
use crate::errors::{PassVaultError, Result};

use super::store::CredentialStore;

/// Orchestrates encryption and storage.  Owns neither the key file nor
/// the schema; it only calls into the components that do.
pub struct VaultManager {
    cipher: VaultCipher,
    store: CredentialStore,
}

impl VaultManager {
    pub fn new(cipher: VaultCipher, store: CredentialStore) -> Self {
        Self { cipher, store }
    }

    /// Load the master key and open the credential database described by
    /// `settings`, resolving relative paths against `data_dir`.
    ///
    /// Fails with `KeyNotFound` / `KeyFormat` before touching the database.
    pub fn open(settings: &Settings, data_dir: &Path) -> Result<Self> {
        let key = KeyStore::new(settings.key_path(data_dir)).load()?;
        let cipher = VaultCipher::new(&key)?;
        let store = CredentialStore::open(&settings.database_path(data_dir))?;
        Ok(Self::new(cipher, store))
    }

    /// Encrypt `plaintext` and store it under `service`.
    pub fn add(&mut self, service: &str, username: &str, plaintext: &str) -> Result<()> {
        validate_service(service)?;

        let payload = self.cipher.encrypt(plaintext)?;
        self.store.insert(service, username, &payload)?;

        tracing::debug!(service, "added credential");
        Ok(())
    }

    /// Look up and decrypt the credential for `service`.
    ///
    /// A missing service is `Ok(None)`.  A record that fails to
    /// authenticate is an error, never a garbled password.
    pub fn get(&self, service: &str) -> Result<Option<(String, String)>> {
        let Some(cred) = self.store.lookup(service)? else {
            return Ok(None);
        };

        let plaintext = self
            .cipher
            .decrypt(&cred.ciphertext)
            .map_err(|e| {
                if matches!(e, PassVaultError::Authentication) {
                    tracing::warn!(service, "credential failed authentication");
                }
                e
            })?;

        Ok(Some((cred.username, plaintext)))
    }

    /// Stored service names, sorted.
    pub fn services(&self) -> Result<Vec<String>> {
        self.store.services()
    }

    /// Collaborator-facing alias for [`VaultManager::add`].
    pub fn add_credential(&mut self, service: &str, username: &str, password: &str) -> Result<()> {
        self.add(service, username, password)
    }

    /// Collaborator-facing alias for [`VaultManager::get`].
    pub fn get_credential(&self, service: &str) -> Result<Option<(String, String)>> {
        self.get(service)
    }

    /// The underlying store, for read-only inspection.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }
}

fn validate_service(service: &str) -> Result<()> {
    if service.trim().is_empty() {
        return Err(PassVaultError::Validation(
            "service name cannot be empty".into(),
        ));
    }
    Ok(())
}

//! The record type persisted by `CredentialStore`.
//!
//! A credential row only ever holds ciphertext.  Plaintext exists in
//! memory between `VaultManager::get` and the caller.

use crate::crypto::EncryptedPayload;

/// A single stored credential, as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Unique service name (the table's primary key).
    pub service: String,

    /// Account name for the service.  Stored in the clear.
    pub username: String,

    /// The encrypted password (version + nonce + ciphertext + tag).
    pub ciphertext: EncryptedPayload,
}

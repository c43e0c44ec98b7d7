//! AES-256-GCM authenticated encryption of single secret values.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce.  The
//! returned payload is self-describing:
//!
//!   [ 1-byte version | 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The version byte is bound in as associated data, so a payload only
//! needs the master key to decrypt and a rewritten version is caught.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroize;

use crate::errors::{PassVaultError, Result};

use super::keystore::MasterKey;

/// Payload layout version for AES-256-GCM.
pub const PAYLOAD_VERSION: u8 = 1;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Version byte plus nonce.
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// The stored form of an encrypted secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload(Vec<u8>);

impl EncryptedPayload {
    /// Wrap bytes read back from storage.  Validation happens on decrypt.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Layout version, if the payload is long enough to have one.
    pub fn version(&self) -> Option<u8> {
        self.0.first().copied()
    }
}

/// Authenticated encryption under the vault's master key.
pub struct VaultCipher {
    cipher: Aes256Gcm,
}

impl VaultCipher {
    /// Build a cipher from the master key.
    pub fn new(key: &MasterKey) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| PassVaultError::Encryption(format!("invalid key length: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedPayload> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let aad = [PAYLOAD_VERSION];

        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|e| PassVaultError::Encryption(format!("encryption error: {e}")))?;

        let mut output = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        output.push(PAYLOAD_VERSION);
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(EncryptedPayload(output))
    }

    /// Decrypt a payload produced by `encrypt`.
    ///
    /// A tag mismatch (wrong key, tampered bytes) is `Authentication`; a
    /// structurally broken payload is `Format`.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<String> {
        let bytes = payload.as_bytes();
        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(PassVaultError::Format(format!(
                "payload is {} bytes, need at least {}",
                bytes.len(),
                HEADER_LEN + TAG_LEN
            )));
        }

        let (version, rest) = (bytes[0], &bytes[1..]);
        if version != PAYLOAD_VERSION {
            return Err(PassVaultError::Format(format!(
                "unsupported payload version {version}"
            )));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let aad = [version];

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| PassVaultError::Authentication)?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            PassVaultError::Format("decrypted value is not valid UTF-8".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(fill: u8) -> VaultCipher {
        VaultCipher::new(&MasterKey::new([fill; 32])).unwrap()
    }

    #[test]
    fn payload_layout_has_version_nonce_and_tag() {
        let c = cipher(1);
        let payload = c.encrypt("abc").unwrap();
        assert_eq!(payload.version(), Some(PAYLOAD_VERSION));
        assert_eq!(payload.as_bytes().len(), HEADER_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let c = cipher(2);
        let payload = c.encrypt("").unwrap();
        assert_eq!(payload.as_bytes().len(), HEADER_LEN + TAG_LEN);
        assert_eq!(c.decrypt(&payload).unwrap(), "");
    }

    #[test]
    fn short_payload_is_format_error() {
        let c = cipher(3);
        let payload = EncryptedPayload::from_bytes(vec![PAYLOAD_VERSION; HEADER_LEN]);
        assert!(matches!(
            c.decrypt(&payload),
            Err(PassVaultError::Format(_))
        ));
    }

    #[test]
    fn unknown_version_is_format_error() {
        let c = cipher(4);
        let mut bytes = c.encrypt("value").unwrap().into_bytes();
        bytes[0] = 9;
        let err = c
            .decrypt(&EncryptedPayload::from_bytes(bytes))
            .unwrap_err();
        assert!(matches!(err, PassVaultError::Format(ref m) if m.contains("version 9")));
    }

    #[test]
    fn payload_decrypts_with_key_alone() {
        let payload = cipher(5).encrypt("value").unwrap();

        // A cipher rebuilt from the same key bytes needs nothing else.
        assert_eq!(cipher(5).decrypt(&payload).unwrap(), "value");
    }

    #[test]
    fn authenticated_non_utf8_is_format_error() {
        // Hand-build a payload whose plaintext is valid GCM but not UTF-8.
        let key = MasterKey::new([6u8; 32]);
        let c = VaultCipher::new(&key).unwrap();
        let raw = Aes256Gcm::new_from_slice(key.as_bytes()).unwrap();
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let aad = [PAYLOAD_VERSION];
        let ct = raw
            .encrypt(
                &nonce,
                Payload {
                    msg: &[0xFF, 0xFE],
                    aad: &aad,
                },
            )
            .unwrap();

        let mut bytes = vec![PAYLOAD_VERSION];
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&ct);

        assert!(matches!(
            c.decrypt(&EncryptedPayload::from_bytes(bytes)),
            Err(PassVaultError::Format(_))
        ));
    }
}

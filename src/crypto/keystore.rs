//! Master key generation, persistence, and loading.
//!
//! The master key is 32 random bytes (AES-256).  On disk it is a single
//! line of standard base64 in a file created with owner-only
//! permissions.
//!
//! The key is stored directly rather than derived from a passphrase, so
//! anyone who can read the key file can decrypt the vault.  Keep the file
//! out of backups that leave the machine.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{PassVaultError, Result};

/// Length of the master key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A wrapper around a 32-byte master key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Draw a fresh key from the OS CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Access the raw key bytes (e.g. to build the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Short hex fingerprint (first 8 bytes of SHA-256) for display.
    ///
    /// This is the only form of the key that may be shown to a user.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes);
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Reads and writes the master key file at an explicit path.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the key file this store manages.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a key file is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Generate a new master key and write it to the key file.
    ///
    /// Any existing key file is replaced.  Guarding against accidental
    /// key loss is the caller's job.
    pub fn generate(&self) -> Result<MasterKey> {
        let key = MasterKey::random();

        let mut encoded = Zeroizing::new(BASE64.encode(key.as_bytes()));
        encoded.push('\n');
        write_private_file(&self.path, encoded.as_bytes())?;

        tracing::info!(
            path = %self.path.display(),
            fingerprint = %key.fingerprint(),
            "generated master key"
        );
        Ok(key)
    }

    /// Load and validate the master key from the key file.
    pub fn load(&self) -> Result<MasterKey> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => Zeroizing::new(c),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PassVaultError::KeyNotFound(self.path.clone()));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(PassVaultError::KeyFormat(
                    "key file is not base64 text".into(),
                ));
            }
            Err(e) => return Err(PassVaultError::io("read key file", &self.path, e)),
        };

        warn_if_readable_by_others(&self.path);

        // Decode errors can echo offending input bytes, so keep the message generic.
        let decoded = Zeroizing::new(
            BASE64
                .decode(contents.trim())
                .map_err(|_| PassVaultError::KeyFormat("key file is not valid base64".into()))?,
        );

        if decoded.len() != KEY_LEN {
            return Err(PassVaultError::KeyFormat(format!(
                "key must be exactly {KEY_LEN} bytes, got {}",
                decoded.len()
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        let key = MasterKey::new(bytes);
        bytes.zeroize();

        tracing::debug!(path = %self.path.display(), "loaded master key");
        Ok(key)
    }
}

/// Write `contents` to `path` through a fresh owner-only temp file,
/// then rename it into place.
///
/// The permissions are applied when the temp file is created, so the key
/// is never readable by other users, even briefly.
fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| PassVaultError::io("create key directory", parent, e))?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    // A leftover from a crashed run may carry looser permissions.
    match fs::remove_file(&tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(PassVaultError::io("remove stale temp file", &tmp_path, e)),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&tmp_path)
        .map_err(|e| PassVaultError::io("create key file", &tmp_path, e))?;
    file.write_all(contents)
        .map_err(|e| PassVaultError::io("write key file", &tmp_path, e))?;
    file.sync_all()
        .map_err(|e| PassVaultError::io("sync key file", &tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| PassVaultError::io("replace key file", path, e))?;
    Ok(())
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{mode:o}"),
                "master key file is accessible to other users"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generate_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("master.key"));

        let generated = store.generate().unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(generated.as_bytes(), loaded.as_bytes());
    }

    #[test]
    fn generate_writes_single_base64_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.key");
        KeyStore::new(&path).generate().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        assert_eq!(BASE64.decode(text.trim()).unwrap().len(), KEY_LEN);
    }

    #[test]
    fn generate_overwrites_existing_key() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("master.key"));

        let first = store.generate().unwrap();
        let second = store.generate().unwrap();
        assert_ne!(first.as_bytes(), second.as_bytes());
        assert_eq!(store.load().unwrap().as_bytes(), second.as_bytes());
    }

    #[test]
    fn generate_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("nested/deeper/master.key"));
        store.generate().unwrap();
        assert!(store.exists());
    }

    #[test]
    fn generate_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        KeyStore::new(dir.path().join("master.key"))
            .generate()
            .unwrap();
        assert!(!dir.path().join(".master.key.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_key_not_found() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("absent.key"));
        assert!(matches!(
            store.load(),
            Err(PassVaultError::KeyNotFound(p)) if p == dir.path().join("absent.key")
        ));
    }

    #[test]
    fn load_rejects_non_base64_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.key");
        fs::write(&path, "this is *not* base64!").unwrap();

        assert!(matches!(
            KeyStore::new(&path).load(),
            Err(PassVaultError::KeyFormat(_))
        ));
    }

    #[test]
    fn load_rejects_wrong_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.key");
        fs::write(&path, BASE64.encode([7u8; 16])).unwrap();

        let err = KeyStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PassVaultError::KeyFormat(ref m) if m.contains("got 16")));
    }

    #[test]
    fn load_rejects_binary_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.key");
        fs::write(&path, [0xFFu8; KEY_LEN]).unwrap();

        assert!(matches!(
            KeyStore::new(&path).load(),
            Err(PassVaultError::KeyFormat(_))
        ));
    }

    #[test]
    fn load_tolerates_surrounding_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spaced.key");
        fs::write(&path, format!("  {}\r\n\n", BASE64.encode([3u8; KEY_LEN]))).unwrap();

        let key = KeyStore::new(&path).load().unwrap();
        assert_eq!(key.as_bytes(), &[3u8; KEY_LEN]);
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let key = MasterKey::new([0x42u8; KEY_LEN]);
        assert_eq!(key.fingerprint(), key.fingerprint());
        assert_eq!(key.fingerprint().len(), 16);
        assert_ne!(
            key.fingerprint(),
            MasterKey::new([0x43u8; KEY_LEN]).fingerprint()
        );
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let key = MasterKey::new([0xABu8; KEY_LEN]);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("fingerprint"));
        assert!(!dbg.contains("171, 171"), "raw byte values leaked: {dbg}");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.key");
        KeyStore::new(&path).generate().unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(
            perms.mode() & 0o777,
            0o600,
            "key file should have 0o600 permissions"
        );
    }
}

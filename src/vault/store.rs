//! SQLite-backed credential table.
//!
//! `CredentialStore` is the only code that reads or writes credential
//! rows.  It never sees plaintext: the password column holds the
//! `EncryptedPayload` bytes produced by `VaultCipher`.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE credentials (
//!     service    TEXT PRIMARY KEY NOT NULL,
//!     username   TEXT NOT NULL,
//!     ciphertext BLOB NOT NULL
//! );
//! ```
//!
//! Every write runs in a `BEGIN IMMEDIATE` transaction and is committed
//! with `synchronous = FULL` before the call returns.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::crypto::EncryptedPayload;
use crate::errors::{PassVaultError, Result};

use super::credential::Credential;

/// How long a write waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable store of (service, username, ciphertext) records.
pub struct CredentialStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Open (or create) the credential database at `path`.
    ///
    /// Missing parent directories are created, the file is restricted to
    /// owner-only access, and the table is created if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| PassVaultError::io("create database directory", parent, e))?;
            }
        }

        create_private(path)?;

        tracing::debug!(path = %path.display(), "opening credential database");
        let conn = Connection::open(path)
            .map_err(|e| PassVaultError::database("open credential database", e))?;

        // SQLite gives its journal files the same mode as the database.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)
                .map_err(|e| PassVaultError::io("restrict permissions on", path, e))?;
        }

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.configure()?;
        store.init()?;
        Ok(store)
    }

    /// Open a throwaway in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PassVaultError::database("open in-memory database", e))?;
        let store = Self { conn, path: None };
        store.configure()?;
        store.init()?;
        Ok(store)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PassVaultError::database("set busy timeout", e))?;
        self.conn
            .pragma_update(None, "synchronous", "FULL")
            .map_err(|e| PassVaultError::database("configure durability", e))?;
        Ok(())
    }

    /// Ensure the credentials table exists.  Safe to call repeatedly.
    pub fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS credentials (
                    service    TEXT PRIMARY KEY NOT NULL,
                    username   TEXT NOT NULL,
                    ciphertext BLOB NOT NULL
                );",
            )
            .map_err(|e| PassVaultError::database("create credentials table", e))
    }

    /// Insert a new record and commit it before returning.
    ///
    /// Fails with `DuplicateService` if `service` already has a record;
    /// the existing row is left untouched.
    pub fn insert(
        &mut self,
        service: &str,
        username: &str,
        ciphertext: &EncryptedPayload,
    ) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| PassVaultError::database("begin insert transaction", e))?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM credentials WHERE service = ?1)",
                params![service],
                |row| row.get(0),
            )
            .map_err(|e| PassVaultError::database("check for existing service", e))?;

        if exists {
            // Dropping `tx` rolls back.
            return Err(PassVaultError::DuplicateService(service.to_string()));
        }

        tx.execute(
            "INSERT INTO credentials (service, username, ciphertext) VALUES (?1, ?2, ?3)",
            params![service, username, ciphertext.as_bytes()],
        )
        .map_err(|e| insert_error(service, e))?;

        tx.commit()
            .map_err(|e| PassVaultError::database("commit insert", e))?;

        tracing::info!(service, "stored credential");
        Ok(())
    }

    /// Fetch the record for `service`, if any.
    pub fn lookup(&self, service: &str) -> Result<Option<Credential>> {
        let row = self
            .conn
            .query_row(
                "SELECT service, username, ciphertext FROM credentials WHERE service = ?1",
                params![service],
                |row| {
                    Ok(Credential {
                        service: row.get(0)?,
                        username: row.get(1)?,
                        ciphertext: EncryptedPayload::from_bytes(row.get(2)?),
                    })
                },
            )
            .optional()
            .map_err(|e| PassVaultError::database("look up credential", e))?;

        tracing::debug!(service, found = row.is_some(), "looked up credential");
        Ok(row)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))
            .map_err(|e| PassVaultError::database("count credentials", e))?;
        row_count(n)
    }

    /// All service names, sorted.  No ciphertext is read.
    pub fn services(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT service FROM credentials ORDER BY service")
            .map_err(|e| PassVaultError::database("prepare service listing", e))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| PassVaultError::database("list services", e))?;

        let mut services = Vec::new();
        for row in rows {
            services.push(row.map_err(|e| PassVaultError::database("read service row", e))?);
        }
        Ok(services)
    }

    /// Path of the backing database file (`None` for in-memory stores).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Create an empty owner-only file at `path` unless one already exists,
/// so SQLite never creates the database with umask permissions.
fn create_private(path: &Path) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    match options.open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(PassVaultError::io("create credential database", path, e)),
    }
}

fn row_count(n: i64) -> Result<usize> {
    usize::try_from(n).map_err(|_| {
        PassVaultError::database(
            "count credentials",
            rusqlite::Error::IntegralValueOutOfRange(0, n),
        )
    })
}

/// A primary-key violation can still race past the EXISTS check when
/// another connection commits first.
fn insert_error(service: &str, e: rusqlite::Error) -> PassVaultError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            PassVaultError::DuplicateService(service.to_string())
        }
        other => PassVaultError::database("insert credential", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn payload(bytes: &[u8]) -> EncryptedPayload {
        EncryptedPayload::from_bytes(bytes.to_vec())
    }

    #[test]
    fn insert_and_lookup_roundtrip() {
        let mut store = CredentialStore::open_in_memory().unwrap();
        store.insert("email", "alice", &payload(b"\x01abc")).unwrap();

        let cred = store.lookup("email").unwrap().unwrap();
        assert_eq!(cred.service, "email");
        assert_eq!(cred.username, "alice");
        assert_eq!(cred.ciphertext.as_bytes(), b"\x01abc");
    }

    #[test]
    fn lookup_missing_service_is_none() {
        let store = CredentialStore::open_in_memory().unwrap();
        assert!(store.lookup("nonexistent").unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_keeps_original_row() {
        let mut store = CredentialStore::open_in_memory().unwrap();
        store.insert("bank", "bob", &payload(b"first")).unwrap();

        let err = store.insert("bank", "mallory", &payload(b"second"));
        assert!(matches!(err, Err(PassVaultError::DuplicateService(ref s)) if s == "bank"));

        assert_eq!(store.count().unwrap(), 1);
        let cred = store.lookup("bank").unwrap().unwrap();
        assert_eq!(cred.username, "bob");
        assert_eq!(cred.ciphertext.as_bytes(), b"first");
    }

    #[test]
    fn service_names_are_case_sensitive() {
        let mut store = CredentialStore::open_in_memory().unwrap();
        store.insert("Email", "a", &payload(b"1")).unwrap();
        store.insert("email", "b", &payload(b"2")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn init_is_idempotent() {
        let store = CredentialStore::open_in_memory().unwrap();
        store.init().unwrap();
        store.init().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn services_are_sorted() {
        let mut store = CredentialStore::open_in_memory().unwrap();
        for name in ["zulu", "alpha", "mike"] {
            store.insert(name, "u", &payload(b"x")).unwrap();
        }
        assert_eq!(store.services().unwrap(), vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");

        {
            let mut store = CredentialStore::open(&path).unwrap();
            store.insert("git", "carol", &payload(b"blob")).unwrap();
        }

        let store = CredentialStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        let cred = store.lookup("git").unwrap().unwrap();
        assert_eq!(cred.username, "carol");
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/passwords.db");
        CredentialStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn constraint_violation_maps_to_duplicate() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
            None,
        );
        assert!(matches!(
            insert_error("svc", err),
            PassVaultError::DuplicateService(ref s) if s == "svc"
        ));
    }

    #[test]
    fn negative_row_count_is_an_error() {
        assert_eq!(row_count(3).unwrap(), 3);
        let err = row_count(-1).unwrap_err();
        assert!(matches!(err, PassVaultError::Database { .. }));
    }

    #[test]
    fn open_keeps_existing_database_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");

        {
            let mut store = CredentialStore::open(&path).unwrap();
            store.insert("git", "carol", &payload(b"blob")).unwrap();
        }

        // Pre-creating the file must not truncate an existing database.
        create_private(&path).unwrap();
        let store = CredentialStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn create_private_is_owner_only_from_creation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");
        create_private(&path).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn loose_existing_database_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");
        CredentialStore::open(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        CredentialStore::open(&path).unwrap();
        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn database_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");
        CredentialStore::open(&path).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}

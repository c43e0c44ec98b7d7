use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PassVault.
///
/// No variant ever carries plaintext secrets or key material.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Input errors ---
    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Key errors ---
    #[error("Master key not found at {0} — run `passvault keygen` first")]
    KeyNotFound(PathBuf),

    #[error("Invalid master key file: {0}")]
    KeyFormat(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Authentication failed — wrong master key or corrupted record")]
    Authentication,

    #[error("Malformed encrypted payload: {0}")]
    Format(String),

    // --- Store errors ---
    #[error("A credential for service '{0}' already exists")]
    DuplicateService(String),

    // --- IO errors ---
    #[error("IO error while trying to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error while trying to {op}: {source}")]
    Database {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- Collaborator errors ---
    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl PassVaultError {
    /// Wrap an `io::Error` with the operation and path it came from.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Wrap a `rusqlite::Error` with the operation it came from.
    pub fn database(op: &'static str, source: rusqlite::Error) -> Self {
        Self::Database { op, source }
    }

    /// Returns `true` for file and database access failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Database { .. })
    }
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;

//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;
pub mod password;

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::Settings;
use crate::crypto::KeyStore;
use crate::errors::{PassVaultError, Result};
use crate::vault::VaultManager;

/// PassVault CLI: local encrypted password vault.
#[derive(Parser)]
#[command(
    name = "passvault",
    about = "Local encrypted password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the key, database, and passvault.toml
    #[arg(long, env = "PASSVAULT_DIR", default_value = ".passvault", global = true)]
    pub data_dir: PathBuf,

    /// Master key file (overrides passvault.toml)
    #[arg(long, env = "PASSVAULT_KEY_FILE", global = true)]
    pub key_file: Option<PathBuf>,

    /// Credential database file (overrides passvault.toml)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a new master key
    Keygen {
        /// Overwrite an existing key without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Add a credential for a service
    Add {
        /// Service name (e.g. email)
        service: String,
        /// Username (omit for interactive prompt)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (omit for interactive prompt)
        #[arg(short, long, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate a random password instead of prompting
        #[arg(short, long)]
        generate: bool,
        /// Length of the generated password
        #[arg(short, long, requires = "generate")]
        length: Option<usize>,
        /// Skip the password strength check
        #[arg(long)]
        skip_check: bool,
    },

    /// Show the username and password for a service
    Get {
        /// Service name
        service: String,
    },

    /// List stored service names
    List,

    /// Print a random password
    Generate {
        /// Password length (default from passvault.toml, else 16)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Copy the credential database to a backup file
    Backup {
        /// Backup file path (default: <data-dir>/backup_passwords_<timestamp>.db)
        dest: Option<PathBuf>,
    },

    /// Replace the credential database with a backup file
    Restore {
        /// Backup file to restore from
        src: PathBuf,
        /// Overwrite the current database without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve a path given on the command line against the current directory.
fn from_cwd(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| PassVaultError::io("resolve current directory for", path, e))?;
    Ok(cwd.join(path))
}

/// The data directory as an absolute path.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    from_cwd(&cli.data_dir)
}

/// Load settings from the data directory and apply CLI overrides.
///
/// Paths passed as flags are relative to the current directory, not the
/// data directory.
pub fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&data_dir(cli)?)?;
    if let Some(ref key_file) = cli.key_file {
        settings.key_file = from_cwd(key_file)?.to_string_lossy().into_owned();
    }
    if let Some(ref db) = cli.db {
        settings.database = from_cwd(db)?.to_string_lossy().into_owned();
    }
    Ok(settings)
}

/// The key store for the configured key file.
pub fn key_store(cli: &Cli) -> Result<KeyStore> {
    let dir = data_dir(cli)?;
    Ok(KeyStore::new(settings(cli)?.key_path(&dir)))
}

/// Full path to the configured credential database.
pub fn database_path(cli: &Cli) -> Result<PathBuf> {
    let dir = data_dir(cli)?;
    Ok(settings(cli)?.database_path(&dir))
}

/// Load the key and open the vault.
pub fn open_manager(cli: &Cli) -> Result<VaultManager> {
    let dir = data_dir(cli)?;
    VaultManager::open(&settings(cli)?, &dir)
}

/// Ask a yes/no question; a non-interactive stdin counts as "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("failed to read confirmation: {e}")))
}

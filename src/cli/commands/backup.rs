//! `passvault backup` / `passvault restore` — plain copies of the
//! credential database.
//!
//! The key file is never copied; a backup is useless without it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::cli::output;
use crate::cli::{confirm, data_dir, database_path, Cli};
use crate::errors::{PassVaultError, Result};
use crate::vault::CredentialStore;

/// Execute the `backup` command.
pub fn execute_backup(cli: &Cli, dest: Option<&Path>) -> Result<()> {
    let src = database_path(cli)?;
    if !src.exists() {
        return Err(PassVaultError::CommandFailed(format!(
            "no credential database at {}",
            src.display()
        )));
    }

    let dest = match dest {
        Some(p) => p.to_path_buf(),
        None => data_dir(cli)?.join(default_backup_name()),
    };
    if dest.exists() {
        return Err(PassVaultError::CommandFailed(format!(
            "backup file {} already exists",
            dest.display()
        )));
    }

    copy_private(&src, &dest)?;
    tracing::info!(src = %src.display(), dest = %dest.display(), "backed up database");

    output::success(&format!("Backup created: {}", dest.display()));
    output::tip("The backup is encrypted with your master key; keep the key file too.");
    Ok(())
}

/// Execute the `restore` command.
///
/// The backup is staged next to the live database and only renamed over
/// it once it opens as a credential database.
pub fn execute_restore(cli: &Cli, src: &Path, force: bool) -> Result<()> {
    if !src.is_file() {
        return Err(PassVaultError::CommandFailed(format!(
            "backup file {} not found",
            src.display()
        )));
    }

    let dest = database_path(cli)?;
    if same_file(src, &dest)? {
        return Err(PassVaultError::CommandFailed(format!(
            "{} is the live credential database",
            src.display()
        )));
    }

    if dest.exists() && !force && !confirm("Replace the current credential database?")? {
        output::tip("Pass --force to overwrite without asking.");
        return Err(PassVaultError::UserCancelled);
    }

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| PassVaultError::io("create database directory", parent, e))?;

    let staged = parent.join(format!(
        ".{}.restore",
        dest.file_name().unwrap_or_default().to_string_lossy()
    ));
    remove_if_exists(&staged)?;

    let count = match copy_private(src, &staged).and_then(|()| validate(&staged)) {
        Ok(count) => count,
        Err(e) => {
            // Best effort: the live database has not been touched.
            let _ = fs::remove_file(&staged);
            return Err(e);
        }
    };

    fs::rename(&staged, &dest)
        .map_err(|e| PassVaultError::io("replace credential database", &dest, e))?;
    tracing::info!(src = %src.display(), dest = %dest.display(), count, "restored database");

    output::success(&format!(
        "Database restored from {} ({count} credential(s))",
        src.display()
    ));
    Ok(())
}

/// `backup_passwords_<YYYYmmdd_HHMMSS>.db`
fn default_backup_name() -> PathBuf {
    PathBuf::from(format!(
        "backup_passwords_{}.db",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Open `path` as a credential database and count its records.
fn validate(path: &Path) -> Result<usize> {
    let store = CredentialStore::open(path)?;
    store.count()
}

fn same_file(a: &Path, b: &Path) -> Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    let a = fs::canonicalize(a).map_err(|e| PassVaultError::io("resolve", a, e))?;
    let b = fs::canonicalize(b).map_err(|e| PassVaultError::io("resolve", b, e))?;
    Ok(a == b)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PassVaultError::io("remove stale file", path, e)),
    }
}

/// Copy `src` into a new file at `dest` that is owner-only from creation.
///
/// Fails if `dest` already exists.
fn copy_private(src: &Path, dest: &Path) -> Result<()> {
    let mut input = File::open(src).map_err(|e| PassVaultError::io("open", src, e))?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut output = options
        .open(dest)
        .map_err(|e| PassVaultError::io("create", dest, e))?;
    io::copy(&mut input, &mut output).map_err(|e| PassVaultError::io("copy database to", dest, e))?;
    output
        .sync_all()
        .map_err(|e| PassVaultError::io("sync", dest, e))?;
    Ok(())
}

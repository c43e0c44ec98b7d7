//! `passvault keygen` — generate the master key.

use crate::cli::output;
use crate::cli::{confirm, database_path, key_store, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `keygen` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let store = key_store(cli)?;

    // Replacing a key orphans every credential encrypted under it.
    if store.exists() && !force {
        output::warning(&format!(
            "A master key already exists at {}",
            store.path().display()
        ));
        if database_path(cli)?.exists() {
            output::warning("Credentials encrypted with the current key will become unreadable.");
        }
        if !confirm("Replace the existing master key?")? {
            output::tip("Pass --force to overwrite without asking.");
            return Err(PassVaultError::UserCancelled);
        }
    }

    let key = store.generate()?;

    output::success(&format!(
        "Master key written to {}",
        store.path().display()
    ));
    output::info(&format!("Key fingerprint: {}", key.fingerprint()));
    output::tip("Keep a copy of this file somewhere safe; without it your passwords cannot be recovered.");

    Ok(())
}

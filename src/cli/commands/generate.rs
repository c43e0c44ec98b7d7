//! `passvault generate` — print a random password.

use crate::cli::password::generate_password;
use crate::cli::{settings, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>) -> Result<()> {
    let length = match length {
        Some(n) => n,
        None => settings(cli)?.password_length,
    };
    if length == 0 {
        return Err(PassVaultError::Validation(
            "password length must be greater than zero".into(),
        ));
    }

    // Plain stdout so the value can be piped.
    println!("{}", generate_password(length));
    Ok(())
}

//! `passvault add` — store a new credential.

use std::io::{self, BufRead, IsTerminal};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::password::{check_strength, generate_password};
use crate::cli::{open_manager, settings, Cli};
use crate::errors::{PassVaultError, Result};

/// Arguments of the `add` command.
pub struct AddOptions<'a> {
    pub service: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub generate: bool,
    pub length: Option<usize>,
    pub skip_check: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, opts: &AddOptions<'_>) -> Result<()> {
    let service = opts.service.trim();

    // Open the vault first so a missing key fails before any prompting.
    let mut manager = open_manager(cli)?;

    let username = match opts.username {
        Some(u) => u.to_string(),
        None => prompt_username()?,
    };

    let password = if opts.generate {
        let length = opts.length.unwrap_or(settings(cli)?.password_length);
        if length == 0 {
            return Err(PassVaultError::Validation(
                "password length must be greater than zero".into(),
            ));
        }
        Zeroizing::new(generate_password(length))
    } else if let Some(p) = opts.password {
        output::warning("Password provided on command line — it may appear in shell history.");
        Zeroizing::new(p.to_string())
    } else {
        read_password(service)?
    };

    if !opts.skip_check {
        check_strength(&password)?;
    }

    manager.add(service, &username, &password)?;

    output::success(&format!("Credential for '{service}' added"));
    if opts.generate {
        output::print_credential(service, &username, &password);
    }

    Ok(())
}

fn prompt_username() -> Result<String> {
    if !io::stdin().is_terminal() {
        return Err(PassVaultError::Validation(
            "username is required — pass --username".into(),
        ));
    }
    dialoguer::Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Read the password from piped stdin, or prompt twice on a terminal.
fn read_password(service: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut line = Zeroizing::new(String::new());
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PassVaultError::io("read password from", "stdin", e))?;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Err(PassVaultError::Validation(
                "password is required — pass --password, --generate, or pipe it on stdin".into(),
            ));
        }
        return Ok(Zeroizing::new(trimmed.to_string()));
    }

    dialoguer::Password::new()
        .with_prompt(format!("Password for {service}"))
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))
}

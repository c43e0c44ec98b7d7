//! `passvault get` — show the username and password for a service.

use crate::cli::output;
use crate::cli::{open_manager, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, service: &str) -> Result<()> {
    let service = service.trim();
    let manager = open_manager(cli)?;

    match manager.get(service)? {
        Some((username, password)) => output::print_credential(service, &username, &password),
        None => {
            output::warning(&format!("No credential stored for '{service}'"));
            output::tip("Run `passvault list` to see stored services.");
        }
    }

    Ok(())
}

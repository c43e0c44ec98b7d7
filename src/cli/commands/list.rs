//! `passvault list` — display stored service names in a table.

use crate::cli::output;
use crate::cli::{open_manager, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = open_manager(cli)?;
    let services = manager.services()?;

    output::info(&format!("{} credential(s)", services.len()));
    output::print_services_table(&services);

    Ok(())
}

//! `nspm list`: show every stored service.

use crate::cli::output;
use crate::cli::{load_settings, Cli, Unlocked};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, show: bool) -> Result<()> {
    let settings = load_settings()?;
    let vault = Unlocked::open(cli, &settings)?;

    output::info(&format!("{} service(s)", vault.session.len()));
    output::print_session_table(&vault.session, show);

    Ok(())
}

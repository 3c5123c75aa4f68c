//! `nspm remove`: delete a service from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, Cli, Unlocked};
use crate::errors::{NspmError, Result};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, service: &str, force: bool) -> Result<()> {
    let settings = load_settings()?;
    let mut vault = Unlocked::open(cli, &settings)?;

    if !vault.session.contains(service) {
        return Err(NspmError::NotFound(service.to_string()));
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove '{service}'?"))
            .default(false)
            .interact()
            .map_err(|e| NspmError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    vault.session.remove(service)?;
    vault.save("remove", Some(service))?;

    output::success(&format!("Removed '{service}'"));

    Ok(())
}

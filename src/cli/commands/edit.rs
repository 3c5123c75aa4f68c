//! `nspm edit`: replace an existing service's password.

use crate::cli::output;
use crate::cli::{load_settings, read_entry_password, report_strength, Cli, Unlocked};
use crate::errors::{NspmError, Result};

/// Execute the `edit` command.
pub fn execute(cli: &Cli, service: &str, password: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let mut vault = Unlocked::open(cli, &settings)?;

    if !vault.session.contains(service) {
        output::tip("Use `nspm add` for a new service.");
        return Err(NspmError::NotFound(service.to_string()));
    }

    let secret = read_entry_password(service, password)?;
    vault.session.edit(service, &secret)?;
    vault.save("edit", Some(service))?;

    report_strength(&secret);
    output::success(&format!("Password for '{service}' updated"));

    Ok(())
}

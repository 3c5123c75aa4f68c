//! `nspm add`: store a password for a new service.

use crate::cli::output;
use crate::cli::{load_settings, read_entry_password, report_strength, Cli, Unlocked};
use crate::errors::Result;
use crate::vault::validate_service_name;

/// Execute the `add` command.
pub fn execute(cli: &Cli, service: &str, password: Option<&str>) -> Result<()> {
    // Reject a bad name before asking for anything.
    validate_service_name(service)?;

    let settings = load_settings()?;
    let mut vault = Unlocked::open(cli, &settings)?;
    let secret = read_entry_password(service, password)?;

    vault.session.add(service, &secret)?;
    vault.save("add", Some(service))?;

    report_strength(&secret);
    output::success(&format!(
        "Password for '{service}' added ({} total)",
        vault.session.len()
    ));

    Ok(())
}

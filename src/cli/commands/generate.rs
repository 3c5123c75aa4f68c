//! `nspm generate`: print a random password, optionally storing it.

use crate::cli::output;
use crate::cli::{load_settings, Cli, Unlocked};
use crate::errors::Result;
use crate::password;
use crate::vault::validate_service_name;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>, save: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let generated = password::generate(length.unwrap_or(settings.generated_length))?;

    if let Some(service) = save {
        validate_service_name(service)?;

        let mut vault = Unlocked::open(cli, &settings)?;
        vault.session.add(service, &generated)?;
        vault.save("add", Some(service))?;

        output::success(&format!("Generated password saved for '{service}'"));
    }

    println!("{}", generated.as_str());
    Ok(())
}

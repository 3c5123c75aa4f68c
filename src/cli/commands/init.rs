//! `nspm init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_password, report_strength, vault_path, Cli};
use crate::errors::{NspmError, Result};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    if path.exists() {
        output::tip("Use `nspm add` to store passwords in the existing vault.");
        return Err(NspmError::AlreadyExists(path));
    }

    let password = prompt_new_password()?;
    report_strength(&password);

    let store = VaultStore::initialize(&path, password.as_bytes(), &settings.argon2_params())?;
    crate::audit::log_audit(store.path(), "init", None, Some("vault created"));

    output::success(&format!("Vault created at {}", store.path().display()));
    output::tip("Run `nspm add <SERVICE>` to store a password.");
    output::tip("Run `nspm shell` for the interactive menu.");

    Ok(())
}

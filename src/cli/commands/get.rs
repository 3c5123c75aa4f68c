//! `nspm get`: print (or copy) a single service's password.

use crate::cli::output;
use crate::cli::{load_settings, Cli, Unlocked};
use crate::errors::{NspmError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, service: &str, copy: bool) -> Result<()> {
    let settings = load_settings()?;
    let vault = Unlocked::open(cli, &settings)?;

    let password = vault
        .session
        .get(service)
        .ok_or_else(|| NspmError::NotFound(service.to_string()))?;

    if copy {
        copy_to_clipboard(password)?;
        output::success(&format!("Password for '{service}' copied to clipboard"));
    } else {
        println!("{password}");
    }

    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| NspmError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| NspmError::CommandFailed(format!("clipboard write: {e}")))
}

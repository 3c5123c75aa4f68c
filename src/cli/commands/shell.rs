//! `nspm shell`: interactive menu over one unlocked session.
//!
//! Changes stay in memory until "Save & quit".  Quitting without saving
//! drops them.

use dialoguer::{Confirm, Input, Password, Select};
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, report_strength, Cli, Unlocked};
use crate::config::Settings;
use crate::errors::{NspmError, Result};
use crate::password;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    List,
    Reveal,
    Add,
    Edit,
    Remove,
    Generate,
    SaveAndQuit,
    QuitWithoutSaving,
}

impl MenuItem {
    const ALL: [MenuItem; 8] = [
        MenuItem::List,
        MenuItem::Reveal,
        MenuItem::Add,
        MenuItem::Edit,
        MenuItem::Remove,
        MenuItem::Generate,
        MenuItem::SaveAndQuit,
        MenuItem::QuitWithoutSaving,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuItem::List => "List services",
            MenuItem::Reveal => "List with passwords",
            MenuItem::Add => "Add",
            MenuItem::Edit => "Edit",
            MenuItem::Remove => "Remove",
            MenuItem::Generate => "Generate",
            MenuItem::SaveAndQuit => "Save & quit",
            MenuItem::QuitWithoutSaving => "Quit without saving",
        }
    }
}

/// Execute the `shell` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let mut vault = Unlocked::open(cli, &settings)?;
    let mut dirty = false;

    output::info(&format!(
        "Unlocked {} ({} service(s))",
        vault.store.path().display(),
        vault.session.len()
    ));

    loop {
        let labels: Vec<&str> = MenuItem::ALL.iter().map(|item| item.label()).collect();
        let choice = Select::new()
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        let item = MenuItem::ALL[choice];
        let outcome = match item {
            MenuItem::List => {
                output::print_session_table(&vault.session, false);
                Ok(false)
            }
            MenuItem::Reveal => {
                if confirm("Print every password to the terminal?")? {
                    output::print_session_table(&vault.session, true);
                }
                Ok(false)
            }
            MenuItem::Add => add(&mut vault),
            MenuItem::Edit => edit(&mut vault),
            MenuItem::Remove => remove(&mut vault),
            MenuItem::Generate => generate(&mut vault, &settings),
            MenuItem::SaveAndQuit => {
                vault.save("save", None)?;
                output::success(&format!("Saved {} service(s)", vault.session.len()));
                return Ok(());
            }
            MenuItem::QuitWithoutSaving => {
                if !dirty || confirm("Discard unsaved changes?")? {
                    output::info("Quit without saving.");
                    return Ok(());
                }
                Ok(false)
            }
        };

        match outcome {
            Ok(changed) => dirty |= changed,
            // Recoverable mistakes are reported and the menu comes back.
            Err(
                e @ (NspmError::DuplicateService(_)
                | NspmError::NotFound(_)
                | NspmError::InvalidServiceName(_)
                | NspmError::ConfigError(_)),
            ) => output::error(&e.to_string()),
            Err(e) => return Err(e),
        }
    }
}

fn add(vault: &mut Unlocked) -> Result<bool> {
    let service: String = Input::new()
        .with_prompt("Service")
        .interact_text()
        .map_err(prompt_err)?;
    if vault.session.contains(&service) {
        return Err(NspmError::DuplicateService(service));
    }

    let secret = read_password(&service)?;
    vault.session.add(&service, &secret)?;
    report_strength(&secret);
    output::success(&format!("Added '{service}' (unsaved)"));
    Ok(true)
}

fn edit(vault: &mut Unlocked) -> Result<bool> {
    let Some(service) = pick_service(vault, "Service to edit")? else {
        return Ok(false);
    };

    let secret = read_password(&service)?;
    vault.session.edit(&service, &secret)?;
    report_strength(&secret);
    output::success(&format!("Updated '{service}' (unsaved)"));
    Ok(true)
}

fn remove(vault: &mut Unlocked) -> Result<bool> {
    let Some(service) = pick_service(vault, "Service to remove")? else {
        return Ok(false);
    };

    if !confirm(&format!("Remove '{service}'?"))? {
        return Ok(false);
    }
    vault.session.remove(&service)?;
    output::success(&format!("Removed '{service}' (unsaved)"));
    Ok(true)
}

fn generate(vault: &mut Unlocked, settings: &Settings) -> Result<bool> {
    let length: usize = Input::new()
        .with_prompt("Length")
        .default(settings.generated_length)
        .interact_text()
        .map_err(prompt_err)?;

    let generated = password::generate(length)?;
    println!("{}", generated.as_str());

    if !confirm("Store it under a service?")? {
        return Ok(false);
    }
    let service: String = Input::new()
        .with_prompt("Service")
        .interact_text()
        .map_err(prompt_err)?;
    vault.session.add(&service, &generated)?;
    output::success(&format!("Added '{service}' (unsaved)"));
    Ok(true)
}

fn pick_service(vault: &Unlocked, prompt: &str) -> Result<Option<String>> {
    let services: Vec<&str> = vault.session.services().collect();
    if services.is_empty() {
        output::info("No passwords in this vault yet.");
        return Ok(None);
    }

    let index = Select::new()
        .with_prompt(prompt)
        .items(&services)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    Ok(Some(services[index].to_string()))
}

fn read_password(service: &str) -> Result<Zeroizing<String>> {
    let pw = Password::new()
        .with_prompt(format!("Password for {service}"))
        .allow_empty_password(true)
        .interact()
        .map_err(prompt_err)?;
    Ok(Zeroizing::new(pw))
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

fn prompt_err(e: dialoguer::Error) -> NspmError {
    NspmError::CommandFailed(format!("prompt: {e}"))
}

//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{NspmError, Result};
use crate::password::evaluate;
use crate::vault::{VaultSession, VaultStore};

/// Minimum master password length accepted by `init`.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable consulted before prompting for the master password.
pub const PASSWORD_ENV: &str = "NSPM_MASTER_PASSWORD";

/// nspm: a local password vault with per-entry keys.
#[derive(Parser)]
#[command(name = "nspm", about = "Local encrypted password manager", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: `vault_dir` from .nspm.toml, else .nspm)
    #[arg(long, global = true)]
    pub vault: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// List stored services
    List {
        /// Also print the passwords
        #[arg(long)]
        show: bool,
    },

    /// Print one service's password
    Get {
        /// Service name
        service: String,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// Store a password for a new service
    Add {
        /// Service name (e.g. github)
        service: String,
        /// Password (omit for piped input or an interactive prompt)
        password: Option<String>,
    },

    /// Change the password of an existing service
    Edit {
        /// Service name
        service: String,
        /// New password (omit for piped input or an interactive prompt)
        password: Option<String>,
    },

    /// Remove a service
    Remove {
        /// Service name
        service: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a random password, optionally storing it
    Generate {
        /// Number of characters (default: `generated_length` from .nspm.toml)
        #[arg(short, long)]
        length: Option<usize>,
        /// Store the generated password under this service
        #[arg(long, value_name = "SERVICE")]
        save: Option<String>,
    },

    /// Interactive menu over an unlocked vault
    Shell,

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Print a shell completion script to stdout
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.nspm.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the vault directory: `--vault` wins over the config file.
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.vault {
        Some(dir) => cwd.join(dir),
        None => settings.vault_path(&cwd),
    })
}

/// Interactive master password prompt.
pub fn prompt_master_password() -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| NspmError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask for the master password until it verifies or `max_attempts`
/// candidates have been rejected.
///
/// Each rejected candidate is audited as `unlock-failed`.  Running out
/// of attempts is `WrongMasterPassword`.
pub fn unlock<F>(store: &VaultStore, max_attempts: u32, mut prompt: F) -> Result<Zeroizing<String>>
where
    F: FnMut() -> Result<Zeroizing<String>>,
{
    for attempt in 1..=max_attempts {
        let candidate = prompt()?;
        if store.verify_master(candidate.as_bytes())? {
            return Ok(candidate);
        }

        crate::audit::log_audit(
            store.path(),
            "unlock-failed",
            None,
            Some(&format!("attempt {attempt} of {max_attempts}")),
        );

        let left = max_attempts - attempt;
        if left > 0 {
            output::warning(&format!("Wrong master password ({left} attempt(s) left)"));
        }
    }

    Err(NspmError::WrongMasterPassword)
}

/// Unlock using `NSPM_MASTER_PASSWORD` when set (one try only),
/// otherwise prompt up to `settings.max_attempts` times.
pub fn unlock_vault(store: &VaultStore, settings: &Settings) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            let mut pw = Some(Zeroizing::new(pw));
            return unlock(store, 1, || {
                pw.take()
                    .ok_or_else(|| NspmError::CommandFailed("password already consumed".into()))
            });
        }
    }

    unlock(store, settings.max_attempts, prompt_master_password)
}

/// An opened, authenticated vault together with its decrypted session.
pub struct Unlocked {
    pub store: VaultStore,
    pub password: Zeroizing<String>,
    pub session: VaultSession,
}

impl Unlocked {
    /// Open the vault, unlock it, and load every entry.
    pub fn open(cli: &Cli, settings: &Settings) -> Result<Self> {
        let path = vault_path(cli, settings)?;
        let store = VaultStore::open(&path).map_err(|e| {
            if matches!(e, NspmError::VaultNotFound(_)) {
                output::tip("Run `nspm init` to create a vault.");
            }
            e
        })?;
        let password = unlock_vault(&store, settings)?;
        let session = store.load(password.as_bytes())?;

        Ok(Self {
            store,
            password,
            session,
        })
    }

    /// Persist the session and record `op` in the audit log.
    pub fn save(&self, op: &str, service: Option<&str>) -> Result<()> {
        self.store.save(&self.session, self.password.as_bytes())?;
        crate::audit::log_audit(
            self.store.path(),
            op,
            service,
            Some(&format!("{} entries", self.session.len())),
        );
        Ok(())
    }
}

/// Prompt for a new master password with confirmation (used by `init`).
///
/// Also respects `NSPM_MASTER_PASSWORD` for scripted use.  Enforces a
/// minimum length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            if pw.chars().count() < MIN_PASSWORD_LEN {
                return Err(NspmError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| NspmError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Read a service password from the argument, piped stdin, or a prompt.
pub fn read_entry_password(service: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        output::warning("Password provided on command line and may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(buf.trim_end_matches(['\n', '\r']).to_string()));
    }

    let pw = dialoguer::Password::new()
        .with_prompt(format!("Password for {service}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| NspmError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Print the strength criteria `password` misses.  Advisory only.
pub fn report_strength(password: &str) {
    for criterion in evaluate(password) {
        output::warning(&format!("Password {criterion}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::Argon2Params;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn vault(dir: &TempDir) -> VaultStore {
        VaultStore::initialize(&dir.path().join("vault"), b"correct horse", &fast()).unwrap()
    }

    #[test]
    fn unlock_accepts_a_later_correct_attempt() {
        let dir = TempDir::new().unwrap();
        let store = vault(&dir);
        let mut answers = vec!["nope", "still nope", "correct horse"].into_iter();

        let pw = unlock(&store, 3, || {
            Ok(Zeroizing::new(answers.next().unwrap().to_string()))
        })
        .unwrap();
        assert_eq!(pw.as_str(), "correct horse");
    }

    #[test]
    fn unlock_gives_up_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let store = vault(&dir);
        let calls = Cell::new(0);

        let result = unlock(&store, 3, || {
            calls.set(calls.get() + 1);
            Ok(Zeroizing::new("wrong".to_string()))
        });

        assert!(matches!(result, Err(NspmError::WrongMasterPassword)));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn unlock_stops_when_the_prompt_fails() {
        let dir = TempDir::new().unwrap();
        let store = vault(&dir);

        let result = unlock(&store, 3, || Err(NspmError::UserCancelled));
        assert!(matches!(result, Err(NspmError::UserCancelled)));
    }

    #[cfg(feature = "audit-log")]
    #[test]
    fn failed_unlocks_are_audited() {
        let dir = TempDir::new().unwrap();
        let store = vault(&dir);

        let _ = unlock(&store, 2, || Ok(Zeroizing::new("wrong".to_string())));

        let audit = crate::audit::AuditLog::open(store.path()).unwrap();
        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.operation == "unlock-failed"));
    }

    #[test]
    fn vault_flag_overrides_config() {
        let cli = Cli::parse_from(["nspm", "--vault", "elsewhere", "list"]);
        let path = vault_path(&cli, &Settings::default()).unwrap();
        assert!(path.ends_with("elsewhere"));

        let cli = Cli::parse_from(["nspm", "list"]);
        let path = vault_path(&cli, &Settings::default()).unwrap();
        assert!(path.ends_with(".nspm"));
    }
}

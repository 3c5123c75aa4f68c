use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{NspmError, Result};

/// Working-directory configuration, loaded from `.nspm.toml`.
///
/// Every field has a default so nspm runs without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault directory, relative to the working directory.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Master-password prompts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Length of passwords produced by `generate`.
    #[serde(default = "default_generated_length")]
    pub generated_length: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".nspm".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_generated_length() -> usize {
    14
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            max_attempts: default_max_attempts(),
            generated_length: default_generated_length(),
        }
    }
}

impl Settings {
    /// Name of the config file looked up in the working directory.
    pub const FILE_NAME: &'static str = ".nspm.toml";

    /// Load settings from `<dir>/.nspm.toml`, falling back to defaults
    /// when the file is absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            NspmError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no command could work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(NspmError::ConfigError(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.vault_dir.trim().is_empty() {
            return Err(NspmError::ConfigError("vault_dir cannot be empty".into()));
        }
        self.argon2_params().validate()
    }

    /// Vault directory resolved against `base`.
    pub fn vault_path(&self, base: &Path) -> PathBuf {
        base.join(&self.vault_dir)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

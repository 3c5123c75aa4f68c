use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in nspm.
#[derive(Debug, Error)]
pub enum NspmError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed: wrong key or tampered ciphertext")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Wrong master password")]
    WrongMasterPassword,

    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Corrupt vault: {0}")]
    CorruptVault(String),

    #[error("Service '{0}' not found")]
    NotFound(String),

    #[error("Service '{0}' already exists (use `edit` to change it)")]
    DuplicateService(String),

    #[error("Invalid service name: {0}")]
    InvalidServiceName(String),

    #[error("Operation cancelled before completion")]
    Cancelled,

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for nspm results.
pub type Result<T> = std::result::Result<T, NspmError>;

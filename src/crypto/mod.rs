//! Cryptographic primitives for nspm.
//!
//! This module provides:
//! - Argon2id password-based key derivation (`kdf`)
//! - AES-256-GCM entry encryption and decryption (`encryption`)
//! - The master-password digest record (`master`)

pub mod encryption;
pub mod kdf;
pub mod master;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad};
pub use kdf::{derive, derive_key, generate_salt, Argon2Params, KEY_LEN, SALT_LEN};
pub use master::{MasterAuth, MasterRecord};

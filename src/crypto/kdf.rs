//! Password-based key derivation using Argon2id.
//!
//! Every entry key and the master digest key come out of this module.
//! Argon2id is memory-hard, so each call is deliberately slow; callers
//! must not try to cache or parallelize around it.

use argon2::{Algorithm, Argon2, Block, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::{NspmError, Result};

/// Length of every generated salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of a derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Largest memory cost accepted, in KiB (4 GiB).
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Largest iteration count accepted.
pub const MAX_ITERATIONS: u32 = 64;

/// Largest lane count accepted.
pub const MAX_PARALLELISM: u32 = 64;

/// Shortest salt Argon2 accepts.
const MIN_SALT_LEN: usize = 8;

/// Smallest output Argon2 will produce.
const MIN_OUTPUT_LEN: usize = 4;

/// Tunable Argon2id work factors.
///
/// These are stored in the vault's master record at initialization so
/// every later derivation for that vault uses the exact same settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject work factors that are too weak, or too large to run.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(NspmError::ConfigError(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(NspmError::ConfigError(format!(
                "Argon2 iterations must be between 1 and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(NspmError::ConfigError(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// Derive `output_len` bytes from a password and salt with Argon2id.
///
/// The same password + salt + params always produce the same bytes.
/// Empty or too-short salts and invalid params are configuration errors;
/// a failure inside Argon2 itself (e.g. allocation) is surfaced as
/// `KeyDerivationFailed` and never retried.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    output_len: usize,
    argon2_params: &Argon2Params,
) -> Result<Vec<u8>> {
    if salt.is_empty() {
        return Err(NspmError::ConfigError("salt must not be empty".into()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(NspmError::ConfigError(format!(
            "salt must be at least {MIN_SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }
    if output_len < MIN_OUTPUT_LEN {
        return Err(NspmError::ConfigError(format!(
            "derived key length must be at least {MIN_OUTPUT_LEN} bytes (got {output_len})"
        )));
    }
    argon2_params.validate()?;

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(output_len),
    )
    .map_err(|e| NspmError::ConfigError(format!("invalid Argon2 params: {e}")))?;

    let block_count = params.block_count();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    // Fallible allocation: out of memory is KeyDerivationFailed.
    let mut blocks: Vec<Block> = Vec::new();
    blocks.try_reserve_exact(block_count).map_err(|e| {
        NspmError::KeyDerivationFailed(format!(
            "cannot allocate {} KiB for Argon2id: {e}",
            argon2_params.memory_kib
        ))
    })?;
    blocks.resize(block_count, Block::default());

    let mut output = vec![0u8; output_len];
    argon2
        .hash_password_into_with_memory(password, salt, &mut output, &mut blocks)
        .map_err(|e| NspmError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(output)
}

/// Derive a 32-byte AES-256 key.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<[u8; KEY_LEN]> {
    let mut bytes = derive(password, salt, KEY_LEN, argon2_params)?;
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

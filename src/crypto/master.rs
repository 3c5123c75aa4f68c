//! Master-password digest record.
//!
//! The record is written once when a vault is initialized and never
//! rewritten.  It holds a salt and a keyed digest:
//!
//! ```text
//! key    = Argon2id(master_password, salt)
//! digest = HMAC-SHA256(key, "nspm master digest v1")
//! ```
//!
//! Verification recomputes the digest with the stored salt and params
//! and compares in constant time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use super::kdf::{derive_key, generate_salt, Argon2Params};
use crate::errors::{NspmError, Result};

/// Current master record format version.
pub const RECORD_VERSION: u8 = 1;

/// Message authenticated by the digest.
const DIGEST_CONTEXT: &[u8] = b"nspm master digest v1";

/// Persisted master-password verification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Format version.
    pub version: u8,

    /// Salt for the master digest (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// HMAC-SHA256 tag proving knowledge of the master password.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub digest: Vec<u8>,

    /// When the vault was initialized.
    pub created_at: DateTime<Utc>,

    /// Argon2id work factors used for this vault, master and entries alike.
    pub argon2_params: Argon2Params,
}

/// Stateless creator/verifier of master records.
///
/// Attempt limits are the caller's business; every call here is
/// independent of the ones before it.
pub struct MasterAuth;

impl MasterAuth {
    /// Build a new record for `password` with a fresh salt.
    pub fn create(password: &[u8], argon2_params: &Argon2Params) -> Result<MasterRecord> {
        let salt = generate_salt();
        let digest = compute_digest(password, &salt, argon2_params)?;

        Ok(MasterRecord {
            version: RECORD_VERSION,
            salt: salt.to_vec(),
            digest,
            created_at: Utc::now(),
            argon2_params: *argon2_params,
        })
    }

    /// Check `password` against a stored record.
    ///
    /// Returns `Ok(false)` on mismatch without revealing where the
    /// digests differ.  Errors only for an unusable record (bad params,
    /// empty salt).
    pub fn verify(password: &[u8], record: &MasterRecord) -> Result<bool> {
        let mut key = derive_key(password, &record.salt, &record.argon2_params)?;
        let mac = digest_mac(&key);
        key.zeroize();

        Ok(mac?.verify_slice(&record.digest).is_ok())
    }
}

fn compute_digest(password: &[u8], salt: &[u8], argon2_params: &Argon2Params) -> Result<Vec<u8>> {
    let mut key = derive_key(password, salt, argon2_params)?;
    let mac = digest_mac(&key);
    key.zeroize();

    Ok(mac?.finalize().into_bytes().to_vec())
}

fn digest_mac(key: &[u8]) -> Result<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| NspmError::KeyDerivationFailed(format!("HMAC init failed: {e}")))?;
    mac.update(DIGEST_CONTEXT);
    Ok(mac)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

//! AES-256-GCM authenticated encryption of a single entry.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{NspmError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &str) -> Result<Vec<u8>> {
    encrypt_with_aad(key, plaintext, b"")
}

/// Decrypt a blob produced by `encrypt`.
pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Zeroizing<String>> {
    decrypt_with_aad(key, blob, b"")
}

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// `aad` is not stored in the blob; the same bytes must be supplied to
/// `decrypt_with_aad`.
pub fn encrypt_with_aad(key: &[u8], plaintext: &str, aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| NspmError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad,
            },
        )
        .map_err(|e| NspmError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt and authenticate a blob against `aad`.
///
/// Every failure (wrong key, tampered or truncated blob, mismatched
/// `aad`, non-UTF-8 plaintext) is `AuthenticationFailed`.
pub fn decrypt_with_aad(key: &[u8], blob: &[u8], aad: &[u8]) -> Result<Zeroizing<String>> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(NspmError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| NspmError::AuthenticationFailed)?;

    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| NspmError::AuthenticationFailed)?;

    String::from_utf8(plaintext)
        .map(Zeroizing::new)
        .map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            NspmError::AuthenticationFailed
        })
}

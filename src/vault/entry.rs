//! Sealed entry records.
//!
//! An `EntryRecord` is one service name together with the salt and
//! ciphertext it was sealed with.  The store always moves entries around
//! as a single ordered `Vec<EntryRecord>`; the three parallel on-disk
//! sequences are produced from (and parsed back into) that vector in one
//! place, `format`, so they cannot drift out of alignment in memory.

use crate::crypto::SALT_LEN;

/// One encrypted entry as it is laid out on disk.
#[derive(Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Service name (e.g. "github").  Stored in plaintext.
    pub service: String,

    /// Salt this entry's key was derived with.
    pub salt: [u8; SALT_LEN],

    /// AES-256-GCM blob (nonce || ciphertext || tag).
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EntryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryRecord")
            .field("service", &self.service)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

//! On-disk layout of a vault directory and the atomic commit protocol.
//!
//! A vault is a directory holding four resources:
//!
//! ```text
//! <vault>/
//!   master        JSON MasterRecord (salt + digest, base64)
//!   services      UTF-8 service names, one per line
//!   salts         32-byte salt blocks, concatenated
//!   ciphertexts   base64 AES-GCM blobs, one per line
//! ```
//!
//! The Nth line of `services`, the Nth block of `salts` and the Nth line
//! of `ciphertexts` belong to the same entry.  Those three files are
//! always replaced together:
//!
//! 1. write `.services.tmp`, `.salts.tmp`, `.ciphertexts.tmp`, fsync each
//! 2. write `.commit` (via `.commit.tmp` + rename), fsync the directory
//! 3. rename each temp file over its resource, fsync the directory
//! 4. delete `.commit`, fsync the directory
//!
//! `recover` finishes step 3 when `.commit` is present and throws the
//! temp files away when it is not, so a crash at any point leaves either
//! the old or the new vault, never a mix of both.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use super::entry::EntryRecord;
use crate::crypto::{MasterRecord, SALT_LEN};
use crate::errors::{NspmError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Master-password record.
pub const MASTER_FILE: &str = "master";

/// Ordered service names.
pub const SERVICES_FILE: &str = "services";

/// Ordered per-entry salts.
pub const SALTS_FILE: &str = "salts";

/// Ordered per-entry ciphertexts.
pub const CIPHERTEXTS_FILE: &str = "ciphertexts";

/// The three resources that make up the entry set, in write order.
const ENTRY_FILES: [&str; 3] = [SERVICES_FILE, SALTS_FILE, CIPHERTEXTS_FILE];

/// Present while a save's temp files are complete but not yet installed.
const COMMIT_MARKER: &str = ".commit";

/// Staging name for the commit marker itself.
const COMMIT_MARKER_TMP: &str = ".commit.tmp";

/// Staging name for the master record at initialization.
const MASTER_TMP: &str = ".master.tmp";

fn tmp_name(resource: &str) -> String {
    format!(".{resource}.tmp")
}

// ---------------------------------------------------------------------------
// Encoded entry set
// ---------------------------------------------------------------------------

/// The three byte buffers written for one entry set.
pub struct EncodedEntries {
    pub services: Vec<u8>,
    pub salts: Vec<u8>,
    pub ciphertexts: Vec<u8>,
}

impl EncodedEntries {
    fn files(&self) -> [(&'static str, &[u8]); 3] {
        [
            (SERVICES_FILE, self.services.as_slice()),
            (SALTS_FILE, self.salts.as_slice()),
            (CIPHERTEXTS_FILE, self.ciphertexts.as_slice()),
        ]
    }
}

/// Flatten an ordered record list into the three parallel resources.
pub fn encode_entries(records: &[EntryRecord]) -> Result<EncodedEntries> {
    let mut encoded = EncodedEntries {
        services: Vec::new(),
        salts: Vec::with_capacity(records.len() * SALT_LEN),
        ciphertexts: Vec::new(),
    };

    for record in records {
        if record.service.is_empty() || record.service.contains(['\n', '\r']) {
            return Err(NspmError::SerializationError(format!(
                "service name {:?} cannot be stored on a single line",
                record.service
            )));
        }
        encoded.services.extend_from_slice(record.service.as_bytes());
        encoded.services.push(b'\n');

        encoded.salts.extend_from_slice(&record.salt);

        encoded
            .ciphertexts
            .extend_from_slice(BASE64.encode(&record.ciphertext).as_bytes());
        encoded.ciphertexts.push(b'\n');
    }

    Ok(encoded)
}

/// Rebuild the ordered record list from the three resources.
///
/// Fails with `CorruptVault` if the sequences do not have exactly the
/// same number of entries; nothing is ever silently dropped.
pub fn decode_entries(services: &[u8], salts: &[u8], ciphertexts: &[u8]) -> Result<Vec<EntryRecord>> {
    let services = std::str::from_utf8(services)
        .map_err(|_| NspmError::CorruptVault(format!("{SERVICES_FILE} is not valid UTF-8")))?;
    let ciphertexts = std::str::from_utf8(ciphertexts)
        .map_err(|_| NspmError::CorruptVault(format!("{CIPHERTEXTS_FILE} is not valid UTF-8")))?;

    let service_lines = split_lines(services, SERVICES_FILE)?;
    let ciphertext_lines = split_lines(ciphertexts, CIPHERTEXTS_FILE)?;

    if salts.len() % SALT_LEN != 0 {
        return Err(NspmError::CorruptVault(format!(
            "{SALTS_FILE} holds {} bytes, not a whole number of {SALT_LEN}-byte salts",
            salts.len()
        )));
    }
    let salt_count = salts.len() / SALT_LEN;

    if service_lines.len() != salt_count || service_lines.len() != ciphertext_lines.len() {
        return Err(NspmError::CorruptVault(format!(
            "misaligned entries: {} services, {} salts, {} ciphertexts",
            service_lines.len(),
            salt_count,
            ciphertext_lines.len()
        )));
    }

    service_lines
        .into_iter()
        .zip(salts.chunks_exact(SALT_LEN))
        .zip(ciphertext_lines)
        .enumerate()
        .map(|(index, ((service, salt_block), line))| {
            if service.is_empty() {
                return Err(NspmError::CorruptVault(format!(
                    "entry {index} has an empty service name"
                )));
            }
            let mut salt = [0u8; SALT_LEN];
            salt.copy_from_slice(salt_block);
            let ciphertext = BASE64.decode(line).map_err(|e| {
                NspmError::CorruptVault(format!("entry {index} ciphertext is not base64: {e}"))
            })?;
            Ok(EntryRecord {
                service: service.to_string(),
                salt,
                ciphertext,
            })
        })
        .collect()
}

/// Split a newline-terminated resource into its lines.
///
/// A non-empty resource without a final newline was cut short.
fn split_lines<'a>(text: &'a str, resource: &str) -> Result<Vec<&'a str>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    match text.strip_suffix('\n') {
        Some(body) => Ok(body.split('\n').collect()),
        None => Err(NspmError::CorruptVault(format!(
            "{resource} is truncated (missing final newline)"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Structural check only: are all four resources present?
///
/// After an interrupted commit a resource may still be sitting in its
/// temp file; that counts, because `recover` will install it.
pub fn is_structurally_valid(dir: &Path) -> bool {
    if !dir.is_dir() || !dir.join(MASTER_FILE).is_file() {
        return false;
    }
    let committed = dir.join(COMMIT_MARKER).is_file();
    ENTRY_FILES.iter().all(|resource| {
        dir.join(resource).is_file() || (committed && dir.join(tmp_name(resource)).is_file())
    })
}

/// Write the master record and an empty entry set into an existing,
/// empty directory.
pub fn create_layout(dir: &Path, master: &MasterRecord) -> Result<()> {
    let master_bytes = serde_json::to_vec_pretty(master)
        .map_err(|e| NspmError::SerializationError(format!("master record: {e}")))?;

    let master_tmp = dir.join(MASTER_TMP);
    write_synced(&master_tmp, &master_bytes)?;
    fs::rename(&master_tmp, dir.join(MASTER_FILE))?;

    for resource in ENTRY_FILES {
        write_synced(&dir.join(resource), &[])?;
    }
    sync_dir(dir)
}

/// Read and parse the master record.
pub fn read_master(dir: &Path) -> Result<MasterRecord> {
    let data = fs::read(dir.join(MASTER_FILE))?;
    let record: MasterRecord = serde_json::from_slice(&data)
        .map_err(|e| NspmError::CorruptVault(format!("{MASTER_FILE} record: {e}")))?;
    record
        .argon2_params
        .validate()
        .map_err(|e| NspmError::CorruptVault(format!("{MASTER_FILE} record: {e}")))?;
    Ok(record)
}

/// Read the three entry resources and align them into records.
pub fn read_entries(dir: &Path) -> Result<Vec<EntryRecord>> {
    let services = read_resource(dir, SERVICES_FILE)?;
    let salts = read_resource(dir, SALTS_FILE)?;
    let ciphertexts = read_resource(dir, CIPHERTEXTS_FILE)?;
    decode_entries(&services, &salts, &ciphertexts)
}

/// Replace the whole entry set with `encoded`, atomically as a unit.
pub fn commit_entries(dir: &Path, encoded: &EncodedEntries) -> Result<()> {
    recover(dir)?;

    // 1. Stage.  On failure the live resources are untouched; drop the
    //    partial temp files so they are not mistaken for a commit.
    if let Err(e) = stage(dir, encoded) {
        discard_temporaries(dir);
        return Err(e);
    }

    // 2. Commit point.
    let marker_tmp = dir.join(COMMIT_MARKER_TMP);
    write_synced(&marker_tmp, b"nspm-commit\n")?;
    fs::rename(&marker_tmp, dir.join(COMMIT_MARKER))?;
    sync_dir(dir)?;
    debug!(vault = %dir.display(), "entry set committed");

    // 3 + 4. Install and clear the marker.
    install_temporaries(dir)?;
    fs::remove_file(dir.join(COMMIT_MARKER))?;
    sync_dir(dir)
}

/// What `recover` found in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing to do.
    Clean,
    /// A committed save was interrupted and has now been completed.
    RolledForward,
    /// Temp files from a save that never committed were deleted.
    DiscardedStale,
}

/// Bring the directory back to a single consistent entry set.
pub fn recover(dir: &Path) -> Result<Recovery> {
    let marker = dir.join(COMMIT_MARKER);
    if marker.is_file() {
        install_temporaries(dir)?;
        fs::remove_file(&marker)?;
        sync_dir(dir)?;
        return Ok(Recovery::RolledForward);
    }

    let mut removed = false;
    for name in ENTRY_FILES
        .iter()
        .map(|resource| tmp_name(resource))
        .chain([COMMIT_MARKER_TMP.to_string()])
    {
        let path = dir.join(name);
        if path.exists() {
            fs::remove_file(&path)?;
            removed = true;
        }
    }

    if removed {
        sync_dir(dir)?;
        Ok(Recovery::DiscardedStale)
    } else {
        Ok(Recovery::Clean)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_resource(dir: &Path, resource: &str) -> Result<Vec<u8>> {
    let path = dir.join(resource);
    if !path.is_file() {
        return Err(NspmError::CorruptVault(format!("missing {resource} resource")));
    }
    Ok(fs::read(path)?)
}

fn stage(dir: &Path, encoded: &EncodedEntries) -> Result<()> {
    for (resource, bytes) in encoded.files() {
        write_synced(&dir.join(tmp_name(resource)), bytes)?;
    }
    Ok(())
}

/// Rename every temp file that is still present over its resource.
///
/// Safe to repeat: resources already renamed have no temp file left.
fn install_temporaries(dir: &Path) -> Result<()> {
    for resource in ENTRY_FILES {
        let tmp = dir.join(tmp_name(resource));
        if tmp.exists() {
            fs::rename(&tmp, dir.join(resource))?;
        }
    }
    sync_dir(dir)
}

fn discard_temporaries(dir: &Path) {
    for resource in ENTRY_FILES {
        let _ = fs::remove_file(dir.join(tmp_name(resource)));
    }
}

/// Create/truncate `path`, write `bytes`, and fsync before returning.
///
/// On Unix the file is owner-only (0600).
fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Flush directory entries (renames, creates, deletes) to disk.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

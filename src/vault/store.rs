//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` wraps the on-disk format and the crypto layer.  It never
//! holds plaintext itself: `load` hands back a `VaultSession`, and `save`
//! takes one.  Every entry gets its own Argon2id key, derived from the
//! master password and that entry's salt, and every save re-seals every
//! entry under a brand-new salt.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::crypto::kdf::{derive_key, generate_salt, Argon2Params};
use crate::crypto::{decrypt_with_aad, encrypt_with_aad, MasterAuth, MasterRecord};
use crate::errors::{NspmError, Result};

use super::cancel::CancelToken;
use super::entry::EntryRecord;
use super::format::{self, Recovery};
use super::session::VaultSession;

/// Handle to an initialized vault directory.
///
/// Create one with `VaultStore::initialize` or `VaultStore::open`.
pub struct VaultStore {
    /// The vault directory.
    root: PathBuf,

    /// Master-password record (salt, digest, KDF params).
    master: MasterRecord,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new, empty vault directory at `path`.
    ///
    /// The master record is derived before anything touches the disk, so
    /// bad Argon2 params leave no trace.  If writing the layout fails the
    /// half-built directory is removed again.
    pub fn initialize(
        path: &Path,
        master_password: &[u8],
        argon2_params: &Argon2Params,
    ) -> Result<Self> {
        Self::initialize_with(path, master_password, argon2_params, Self::populate)
    }

    fn initialize_with<F>(
        path: &Path,
        master_password: &[u8],
        argon2_params: &Argon2Params,
        populate: F,
    ) -> Result<Self>
    where
        F: FnOnce(&Path, &MasterRecord) -> Result<()>,
    {
        if path.exists() {
            return Err(NspmError::AlreadyExists(path.to_path_buf()));
        }

        let master = MasterAuth::create(master_password, argon2_params)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => NspmError::AlreadyExists(path.to_path_buf()),
            _ => NspmError::Io(e),
        })?;

        if let Err(e) = populate(path, &master) {
            let _ = fs::remove_dir_all(path);
            return Err(e);
        }

        info!(vault = %path.display(), "vault initialized");
        Ok(Self {
            root: path.to_path_buf(),
            master,
        })
    }

    fn populate(path: &Path, master: &MasterRecord) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
        format::create_layout(path, master)
    }

    /// Structural check: does `path` look like a vault?
    ///
    /// Never reads the master record or decrypts anything.
    pub fn validate(path: &Path) -> bool {
        format::is_structurally_valid(path)
    }

    /// Open an existing vault without unlocking it.
    ///
    /// Finishes (or discards) a save that was interrupted by a crash,
    /// then reads the master record.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NspmError::VaultNotFound(path.to_path_buf()));
        }
        if !Self::validate(path) {
            return Err(NspmError::CorruptVault(format!(
                "{} is missing one or more vault resources",
                path.display()
            )));
        }

        match format::recover(path)? {
            Recovery::Clean => {}
            Recovery::RolledForward => {
                warn!(vault = %path.display(), "completed an interrupted save");
            }
            Recovery::DiscardedStale => {
                warn!(vault = %path.display(), "discarded an uncommitted save");
            }
        }

        let master = format::read_master(path)?;
        debug!(vault = %path.display(), "vault opened");

        Ok(Self {
            root: path.to_path_buf(),
            master,
        })
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Check a candidate master password against the stored digest.
    pub fn verify_master(&self, master_password: &[u8]) -> Result<bool> {
        MasterAuth::verify(master_password, &self.master)
    }

    fn authenticate(&self, master_password: &[u8]) -> Result<()> {
        if self.verify_master(master_password)? {
            Ok(())
        } else {
            Err(NspmError::WrongMasterPassword)
        }
    }

    // ------------------------------------------------------------------
    // Load / save
    // ------------------------------------------------------------------

    /// Decrypt every entry into a new session.
    pub fn load(&self, master_password: &[u8]) -> Result<VaultSession> {
        self.load_with(master_password, &CancelToken::new())
    }

    /// `load`, checking `cancel` between entries.
    ///
    /// The master digest is verified first, so any entry that then fails
    /// to decrypt means the data is damaged, not that the password is
    /// wrong.  No partial session is ever returned.
    pub fn load_with(&self, master_password: &[u8], cancel: &CancelToken) -> Result<VaultSession> {
        self.load_inner(master_password, cancel, |_| {})
    }

    fn load_inner(
        &self,
        master_password: &[u8],
        cancel: &CancelToken,
        mut after_entry: impl FnMut(usize),
    ) -> Result<VaultSession> {
        self.authenticate(master_password)?;

        let records = format::read_entries(&self.root)?;
        let mut session = VaultSession::new();

        for (index, record) in records.into_iter().enumerate() {
            cancel.check()?;

            let mut key = derive_key(master_password, &record.salt, self.params())?;
            let plaintext = decrypt_with_aad(&key, &record.ciphertext, record.service.as_bytes());
            key.zeroize();

            let plaintext = plaintext.map_err(|e| match e {
                NspmError::AuthenticationFailed => NspmError::CorruptVault(format!(
                    "entry {index} ('{}') failed authentication",
                    record.service
                )),
                other => other,
            })?;

            session
                .push_loaded(record.service, plaintext)
                .map_err(|e| match e {
                    NspmError::DuplicateService(service) => NspmError::CorruptVault(format!(
                        "service '{service}' appears more than once"
                    )),
                    other => other,
                })?;
            after_entry(index);
        }

        debug!(entries = session.len(), "vault loaded");
        Ok(session)
    }

    /// Re-encrypt the whole session and replace the vault's entry set.
    pub fn save(&self, session: &VaultSession, master_password: &[u8]) -> Result<()> {
        self.save_with(session, master_password, &CancelToken::new())
    }

    /// `save`, checking `cancel` between entries.
    ///
    /// Every entry is sealed before a single byte is written, so an
    /// encryption failure or a cancellation leaves the previous vault
    /// untouched.
    pub fn save_with(
        &self,
        session: &VaultSession,
        master_password: &[u8],
        cancel: &CancelToken,
    ) -> Result<()> {
        self.save_inner(session, master_password, cancel, |_| {})
    }

    fn save_inner(
        &self,
        session: &VaultSession,
        master_password: &[u8],
        cancel: &CancelToken,
        mut after_entry: impl FnMut(usize),
    ) -> Result<()> {
        // Sealing under the wrong password would make the vault unreadable.
        self.authenticate(master_password)?;

        let mut records = Vec::with_capacity(session.len());
        for (index, (service, password)) in session.iter().enumerate() {
            cancel.check()?;
            records.push(self.seal(master_password, service, password)?);
            after_entry(index);
        }
        cancel.check()?;

        let encoded = format::encode_entries(&records)?;
        format::commit_entries(&self.root, &encoded)?;

        info!(entries = records.len(), "vault saved");
        Ok(())
    }

    fn seal(&self, master_password: &[u8], service: &str, password: &str) -> Result<EntryRecord> {
        let salt = generate_salt();
        let mut key = derive_key(master_password, &salt, self.params())?;
        let ciphertext = encrypt_with_aad(&key, password, service.as_bytes());
        key.zeroize();

        Ok(EntryRecord {
            service: service.to_string(),
            salt,
            ciphertext: ciphertext?,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the vault directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns the master record (salt, digest, creation time, params).
    pub fn master_record(&self) -> &MasterRecord {
        &self.master
    }

    fn params(&self) -> &Argon2Params {
        &self.master.argon2_params
    }
}

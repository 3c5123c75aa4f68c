//! The decrypted, in-memory view of a vault.
//!
//! A `VaultSession` maps service names to plaintext passwords.  It keeps
//! insertion order, because that order is exactly the order entries are
//! written to disk on the next save.  Nothing here touches the
//! filesystem; only `VaultStore::save` persists a session.

use std::fmt;

use zeroize::Zeroizing;

use crate::errors::{NspmError, Result};

/// Longest accepted service name, in bytes.
const MAX_SERVICE_LEN: usize = 256;

/// Ordered service -> password mapping for one unlocked vault.
#[derive(Default)]
pub struct VaultSession {
    entries: Vec<(String, Zeroizing<String>)>,
}

impl VaultSession {
    /// An empty session (what a freshly initialized vault loads as).
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Add a new entry.
    ///
    /// An existing service is never overwritten here; use `edit`.
    pub fn add(&mut self, service: &str, password: &str) -> Result<()> {
        validate_service_name(service)?;
        if self.contains(service) {
            return Err(NspmError::DuplicateService(service.to_string()));
        }
        self.entries
            .push((service.to_string(), Zeroizing::new(password.to_string())));
        Ok(())
    }

    /// Replace the password of an existing entry, keeping its position.
    pub fn edit(&mut self, service: &str, new_password: &str) -> Result<()> {
        let index = self
            .position(service)
            .ok_or_else(|| NspmError::NotFound(service.to_string()))?;
        self.entries[index].1 = Zeroizing::new(new_password.to_string());
        Ok(())
    }

    /// Remove an entry.  Later entries keep their relative order.
    pub fn remove(&mut self, service: &str) -> Result<()> {
        let index = self
            .position(service)
            .ok_or_else(|| NspmError::NotFound(service.to_string()))?;
        self.entries.remove(index);
        Ok(())
    }

    /// Append an entry decrypted from disk.
    pub(crate) fn push_loaded(&mut self, service: String, password: Zeroizing<String>) -> Result<()> {
        if self.contains(&service) {
            return Err(NspmError::DuplicateService(service));
        }
        self.entries.push((service, password));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Plaintext password for `service`, if present.
    pub fn get(&self, service: &str) -> Option<&str> {
        self.position(service)
            .map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, service: &str) -> bool {
        self.position(service).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Service names in session order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(service, _)| service.as_str())
    }

    /// `(service, password)` pairs in session order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(service, password)| (service.as_str(), password.as_str()))
    }

    fn position(&self, service: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == service)
    }
}

/// Sessions are equal when they hold the same mapping, in any order.
impl PartialEq for VaultSession {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(service, password)| other.get(service) == Some(password))
    }
}

impl Eq for VaultSession {}

impl fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.services().map(|service| (service, "<redacted>")))
            .finish()
    }
}

/// Check that a service name can be stored as one line of the services
/// resource.
///
/// Must be non-empty, at most 256 bytes, and free of line breaks.
pub fn validate_service_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NspmError::InvalidServiceName(
            "service name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_SERVICE_LEN {
        return Err(NspmError::InvalidServiceName(format!(
            "service name cannot exceed {MAX_SERVICE_LEN} bytes"
        )));
    }
    if name.contains(['\n', '\r']) {
        return Err(NspmError::InvalidServiceName(
            "service name cannot contain line breaks".into(),
        ));
    }
    Ok(())
}

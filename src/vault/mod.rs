//! Vault module: encrypted, directory-backed password storage.
//!
//! This module provides:
//! - The in-memory `VaultSession` (`session`)
//! - Sealed `EntryRecord`s (`entry`)
//! - The directory layout and atomic commit protocol (`format`)
//! - High-level `VaultStore` for initializing, loading and saving (`store`)
//! - Between-entry cancellation (`cancel`)

pub mod cancel;
pub mod entry;
pub mod format;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use cancel::CancelToken;
pub use entry::EntryRecord;
pub use session::{validate_service_name, VaultSession};
pub use store::VaultStore;

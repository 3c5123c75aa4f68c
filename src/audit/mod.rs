//! Audit log: SQLite-based operation history.
//!
//! Records every vault operation (init, add, edit, remove, save,
//! unlock-failed) in `<vault>/audit.db`.  Only service names are
//! stored, never passwords.
//!
//! Logging is fire-and-forget: if the database can't be opened or
//! written to, the command carries on without it.  Built without the
//! `audit-log` feature, `log_audit` does nothing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

#[cfg(feature = "audit-log")]
use rusqlite::Connection;

#[cfg(feature = "audit-log")]
use crate::errors::{NspmError, Result};

/// File name of the audit database inside a vault directory.
pub const DB_FILE: &str = "audit.db";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub vault: String,
    pub service: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
#[cfg(feature = "audit-log")]
pub struct AuditLog {
    conn: Connection,
}

#[cfg(feature = "audit-log")]
impl AuditLog {
    /// Open (or create) the audit database at `<vault_dir>/audit.db`.
    ///
    /// Returns `None` when the database is unavailable.
    pub fn open(vault_dir: &Path) -> Option<Self> {
        let db_path = audit_db_path(vault_dir);
        let conn = Connection::open(&db_path).ok()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                operation TEXT NOT NULL,
                vault     TEXT NOT NULL,
                service   TEXT,
                details   TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation.  Errors are ignored.
    pub fn log(&self, operation: &str, vault: &str, service: Option<&str>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, vault, service, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, vault, service, details],
        );
    }

    /// Most recent entries first, at most `limit` of them, optionally
    /// only those at or after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        // RFC 3339 strings from `Utc::now()` sort chronologically, so a
        // text comparison is enough.  The empty string matches everything.
        let since_str = since.map(|ts| ts.to_rfc3339()).unwrap_or_default();

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, vault, service, details
                 FROM audit_log
                 WHERE timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| NspmError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since_str, limit_i64], |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    vault: row.get(3)?,
                    service: row.get(4)?,
                    details: row.get(5)?,
                })
            })
            .map_err(|e| NspmError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| NspmError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }
}

/// Log an audit event for the vault at `vault_dir`.
///
/// Never fails the calling command.  Does nothing if the vault
/// directory does not exist, so a failed `init` leaves no stray
/// database behind.
pub fn log_audit(vault_dir: &Path, op: &str, service: Option<&str>, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    {
        if !vault_dir.is_dir() {
            return;
        }
        if let Some(audit) = AuditLog::open(vault_dir) {
            audit.log(op, &vault_label(vault_dir), service, details);
        }
    }

    #[cfg(not(feature = "audit-log"))]
    let _ = (vault_dir, op, service, details);
}

/// Short name used in the `vault` column: the directory's final component.
#[cfg(feature = "audit-log")]
fn vault_label(vault_dir: &Path) -> String {
    vault_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| vault_dir.display().to_string())
}

/// Where the audit database for `vault_dir` lives.
pub fn audit_db_path(vault_dir: &Path) -> PathBuf {
    vault_dir.join(DB_FILE)
}

#[cfg(all(test, feature = "audit-log"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path());
        assert!(audit.is_some());
        assert!(dir.path().join("audit.db").exists());
    }

    #[test]
    fn log_and_query_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("add", ".nspm", Some("github"), None);
        audit.log("edit", ".nspm", Some("github"), None);
        audit.log("remove", ".nspm", Some("mail"), None);

        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].operation, "remove");
        assert_eq!(entries[1].operation, "edit");
        assert_eq!(entries[2].operation, "add");
    }

    #[test]
    fn query_respects_limit() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        for i in 0..10 {
            audit.log("add", ".nspm", Some(&format!("svc-{i}")), None);
        }

        assert_eq!(audit.query(3, None).unwrap().len(), 3);
    }

    #[test]
    fn query_with_since_filter() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("save", ".nspm", None, Some("1 entries"));

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(audit.query(10, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn log_audit_labels_rows_with_vault_dir_name() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("personal");
        std::fs::create_dir(&vault).unwrap();

        log_audit(&vault, "init", None, Some("vault created"));

        let entries = AuditLog::open(&vault).unwrap().query(1, None).unwrap();
        assert_eq!(entries[0].vault, "personal");
        assert_eq!(entries[0].operation, "init");
        assert!(entries[0].service.is_none());
        assert_eq!(entries[0].details.as_deref(), Some("vault created"));
    }

    #[test]
    fn log_audit_skips_missing_vault_dir() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("absent");

        log_audit(&vault, "unlock-failed", None, None);
        assert!(!vault.exists());
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let _audit = AuditLog::open(dir.path()).unwrap();

        let perms = std::fs::metadata(audit_db_path(dir.path()))
            .unwrap()
            .permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}

//! `nspm audit`: display the audit log.
//!
//! Usage:
//!   nspm audit               # show last 50 entries
//!   nspm audit --last 20     # show last 20
//!   nspm audit --since 7d    # entries from last 7 days

use chrono::{DateTime, Utc};

use crate::cli::{load_settings, vault_path, Cli};
use crate::errors::{NspmError, Result};

#[cfg(feature = "audit-log")]
use crate::audit::{AuditEntry, AuditLog};
#[cfg(feature = "audit-log")]
use crate::cli::output;

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let vault_dir = vault_path(cli, &settings)?;
    if !vault_dir.is_dir() {
        return Err(NspmError::VaultNotFound(vault_dir));
    }

    let audit = AuditLog::open(&vault_dir)
        .ok_or_else(|| NspmError::AuditError("failed to open audit database".into()))?;

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Execute the `audit` command.
#[cfg(not(feature = "audit-log"))]
pub fn execute(cli: &Cli, _last: usize, since: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let _ = vault_path(cli, &settings)?;
    since.map(parse_duration).transpose()?;
    Err(NspmError::AuditError(
        "this build of nspm has no audit log (feature `audit-log` disabled)".into(),
    ))
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the instant that long ago.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, chrono::Duration::days as fn(i64) -> chrono::Duration)
    } else if let Some(s) = input.strip_suffix('h') {
        (s, chrono::Duration::hours as fn(i64) -> chrono::Duration)
    } else if let Some(s) = input.strip_suffix('m') {
        (s, chrono::Duration::minutes as fn(i64) -> chrono::Duration)
    } else {
        return Err(NspmError::CommandFailed(format!(
            "invalid duration '{input}'; use format like 7d, 24h, or 30m"
        )));
    };

    let num: i64 = num_str
        .parse()
        .ok()
        .filter(|n| (0..=36_500).contains(n))
        .ok_or_else(|| {
            NspmError::CommandFailed(format!(
                "invalid duration '{input}'; number part is not valid"
            ))
        })?;

    Ok(Utc::now() - unit(num))
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Vault", "Service", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.vault.clone(),
            entry.service.as_deref().unwrap_or("-").to_string(),
            entry.details.as_deref().unwrap_or("-").to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" => style(op).green().to_string(),
        "add" | "edit" | "save" => style(op).blue().to_string(),
        "remove" => style(op).red().to_string(),
        "unlock-failed" => style(op).yellow().to_string(),
        _ => op.to_string(),
    }
}

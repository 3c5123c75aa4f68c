//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::VaultSession;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the session's services in stored order, with passwords when
/// `show` is set.
pub fn print_session_table(session: &VaultSession, show: bool) {
    if session.is_empty() {
        info("No passwords in this vault yet.");
        tip("Run `nspm add <SERVICE>` to store your first password.");
        return;
    }

    println!("{}", session_table(session, show));
}

/// Build the service table; the password column exists only with `show`.
pub fn session_table(session: &VaultSession, show: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if show {
        table.set_header(vec!["#", "Service", "Password"]);
    } else {
        table.set_header(vec!["#", "Service"]);
    }

    for (index, (service, password)) in session.iter().enumerate() {
        let mut row = vec![(index + 1).to_string(), service.to_string()];
        if show {
            row.push(password.to_string());
        }
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> VaultSession {
        let mut session = VaultSession::new();
        session.add("github", "p@ssw0rd1").unwrap();
        session.add("mail", "hunter2!").unwrap();
        session
    }

    #[test]
    fn passwords_stay_hidden_by_default() {
        let text = session_table(&session(), false).to_string();
        assert!(text.contains("github"));
        assert!(text.contains("mail"));
        assert!(!text.contains("p@ssw0rd1"));
        assert!(!text.contains("Password"));
    }

    #[test]
    fn show_reveals_each_password_beside_its_service() {
        let text = session_table(&session(), true).to_string();
        let github = text.lines().find(|l| l.contains("github")).unwrap();
        let mail = text.lines().find(|l| l.contains("mail")).unwrap();
        assert!(github.contains("p@ssw0rd1"));
        assert!(mail.contains("hunter2!"));
    }
}

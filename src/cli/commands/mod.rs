//! One module per subcommand.  Each exposes `execute`.

pub mod add;
pub mod audit_cmd;
pub mod completions;
pub mod edit;
pub mod generate;
pub mod get;
pub mod init;
pub mod list;
pub mod remove;
pub mod shell;

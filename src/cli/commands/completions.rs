//! `nspm completions <SHELL>`: print a completion script for nspm's own
//! command tree, e.g. `nspm completions zsh > ~/.zfunc/_nspm`.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

const BIN_NAME: &str = "nspm";

pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Render the script for `shell` into `out`.
pub fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, &mut buf);
    out.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        write_script(shell, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn scripts_know_the_vault_commands() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let text = script(shell);
            for command in ["init", "add", "edit", "remove", "shell"] {
                assert!(text.contains(command), "{shell}: no '{command}'");
            }
        }
    }

    #[test]
    fn shell_argument_is_a_closed_set() {
        let cli = Cli::try_parse_from(["nspm", "completions", "powershell"]).unwrap();
        assert!(matches!(
            cli.command,
            crate::cli::Commands::Completions {
                shell: Shell::PowerShell
            }
        ));
        assert!(Cli::try_parse_from(["nspm", "completions", "csh"]).is_err());
    }
}

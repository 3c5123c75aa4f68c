use clap::Parser;
use nspm::cli::commands;
use nspm::cli::{Cli, Commands};

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::List { show } => commands::list::execute(&cli, show),
        Commands::Get { ref service, copy } => commands::get::execute(&cli, service, copy),
        Commands::Add {
            ref service,
            ref password,
        } => commands::add::execute(&cli, service, password.as_deref()),
        Commands::Edit {
            ref service,
            ref password,
        } => commands::edit::execute(&cli, service, password.as_deref()),
        Commands::Remove { ref service, force } => {
            commands::remove::execute(&cli, service, force)
        }
        Commands::Generate { length, ref save } => {
            commands::generate::execute(&cli, length, save.as_deref())
        }
        Commands::Shell => commands::shell::execute(&cli),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        nspm::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default: warn).
fn init_logging() {
    use tracing_subscriber::{filter::EnvFilter, fmt};

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

//! roster CLI - log in and run URL-driven searches.
//!
//! The main entry point for the `roster` CLI binary.

use anyhow::Result;
use clap::Parser;
use roster_core::{LogFormat, init_logging};

use roster_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.config();

    init_logging(
        if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Compact
        },
        "warn",
    );

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Login(args) => roster_cli::commands::login::execute(args, &config).await,
            Commands::Logout => roster_cli::commands::logout::execute(&config),
            Commands::Whoami => roster_cli::commands::whoami::execute(&config),
            Commands::Search(args) => roster_cli::commands::search::execute(args, &config).await,
            Commands::Shell(args) => roster_cli::commands::shell::execute(args, &config).await,
        }
    })
}

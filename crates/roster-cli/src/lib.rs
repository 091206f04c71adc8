//! # roster-cli
//!
//! Command-line client for roster.
//!
//! ## Commands
//!
//! - `roster login <name>` - Authenticate and remember the user
//! - `roster logout` - Forget the remembered user
//! - `roster whoami` - Show the remembered user
//! - `roster search` - Run one URL-driven search and print the results
//! - `roster shell` - Interactive search session with back/forward history
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `ROSTER_API_URL` - API endpoint (default: `http://localhost:8000`)
//! - `ROSTER_STATE_DIR` - Where the logged-in user is kept (default: `~/.roster`)
//! - `ROSTER_TIMEOUT_SECS` - Per-request timeout (default: 30)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;
pub mod render;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use roster_core::{FileStore, IdentityHolder};

/// roster CLI - log in and search by URL parameters.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API server URL.
    #[arg(long, env = "ROSTER_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Directory holding the remembered identity.
    #[arg(long, env = "ROSTER_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ROSTER_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            state_dir: self.state_dir.clone().unwrap_or_else(default_state_dir),
            timeout: Duration::from_secs(self.timeout_secs),
            format: self.format.clone(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".roster"),
        |home| PathBuf::from(home).join(".roster"),
    )
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in by name.
    Login(commands::login::LoginArgs),
    /// Forget the logged-in user.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Run a search from a location and print the results.
    Search(commands::search::SearchArgs),
    /// Interactive search session.
    Shell(commands::shell::ShellArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server URL.
    pub api_url: String,
    /// Directory holding the remembered identity.
    pub state_dir: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Output format.
    pub format: OutputFormat,
}

impl Config {
    /// Loads the identity holder backed by the state directory.
    #[must_use]
    pub fn identity_holder(&self) -> Arc<IdentityHolder> {
        Arc::new(IdentityHolder::load(Arc::new(FileStore::new(
            &self.state_dir,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "roster",
            "--api-url",
            "https://api.example.com",
            "--state-dir",
            "/tmp/roster-state",
            "--timeout-secs",
            "5",
            "--format",
            "json",
            "whoami",
        ]);

        let config = cli.config();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/roster-state"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(matches!(config.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn test_search_subcommand_parsing() {
        let cli = Cli::parse_from([
            "roster",
            "search",
            "--location",
            "/search?current_id=7",
            "--min-age",
            "25",
        ]);

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.location, "/search?current_id=7");
        assert_eq!(args.min_age.as_deref(), Some("25"));
        assert!(!args.clear);
    }
}

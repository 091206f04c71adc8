//! Login command - authenticate by name and remember the user.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::client::ApiClient;
use crate::{Config, OutputFormat};

/// Arguments for the login command.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Name to log in as.
    #[arg()]
    pub name: String,
}

/// Execute the login command.
///
/// # Errors
///
/// Returns the login failure (missing name, rejected, network error) as shown
/// to the user. Nothing is stored on failure.
pub async fn execute(args: LoginArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let holder = config.identity_holder();

    let location = roster_core::remote::login(&client, &holder, &args.name).await?;
    let identity = holder.get();

    match config.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "user": identity,
                "location": location.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            let name = identity.map(|i| i.name).unwrap_or_default();
            println!("{} Logged in as {}", "✓".green(), name.bold());
            println!("Next: roster search --location '{location}'");
        }
    }

    Ok(())
}

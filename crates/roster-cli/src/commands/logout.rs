//! Logout command - forget the remembered user.

use anyhow::Result;

use crate::{Config, OutputFormat};

/// Execute the logout command.
///
/// # Errors
///
/// Returns an error if the stored identity cannot be removed.
pub fn execute(config: &Config) -> Result<()> {
    let holder = config.identity_holder();
    let previous = holder.get();
    holder.set(None)?;

    match config.format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "logged_out": previous.is_some() });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Table => match previous {
            Some(identity) => println!("Logged out {}", identity.name),
            None => println!("Not logged in"),
        },
    }

    Ok(())
}

//! Whoami command - show the remembered user.

use anyhow::Result;

use crate::{Config, OutputFormat};

/// Execute the whoami command.
///
/// # Errors
///
/// Returns an error if the output cannot be serialized.
pub fn execute(config: &Config) -> Result<()> {
    let identity = config.identity_holder().get();

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        OutputFormat::Text => match identity {
            Some(identity) => println!("{} (current_id={})", identity.name, identity.id),
            None => println!("Not logged in"),
        },
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct IdentityRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Permid")]
                permid: String,
            }

            match identity {
                Some(identity) => {
                    let row = IdentityRow {
                        id: identity.id.to_string(),
                        name: identity.name,
                        permid: identity.permid.to_string(),
                    };
                    println!("{}", Table::new(vec![row]));
                }
                None => println!("Not logged in"),
            }
        }
    }

    Ok(())
}

//! Search command - evaluate one location and print its results.

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use roster_core::{IdentityHolder, Location, ResultSet};

use crate::Config;
use crate::render;
use crate::session::{Session, not_logged_in};

/// Arguments for the search command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Location to open, e.g. `/search?current_id=7` or a full shared link.
    #[arg(long, short = 'l', default_value = "/search")]
    pub location: String,

    /// Set the minimum age filter (an empty value removes it).
    #[arg(long)]
    pub min_age: Option<String>,

    /// Remove the minimum age filter.
    #[arg(long, conflicts_with = "min_age")]
    pub clear: bool,
}

/// Execute the search command.
///
/// # Errors
///
/// Returns an error if the location is invalid or no user is logged in.
pub async fn execute(args: SearchArgs, config: &Config) -> Result<()> {
    let (location, results) = run(&args, config, config.identity_holder()).await?;
    println!(
        "{}",
        render::search_results(&location, &results, &config.format)?
    );
    Ok(())
}

/// Opens the location, applies the requested filter edit and waits for the
/// results of the settled parameters.
///
/// Returns the final location and its results.
///
/// # Errors
///
/// Returns an error if the location is not the search view or the session
/// redirects to the entry view for lack of an identity.
pub async fn run(
    args: &SearchArgs,
    config: &Config,
    holder: Arc<IdentityHolder>,
) -> Result<(Location, ResultSet)> {
    let location = Location::parse(&args.location)?;
    let session = Session::start(config, holder, location, |handle| {
        if let Some(min_age) = &args.min_age {
            handle.apply_filter(min_age);
        } else if args.clear {
            handle.clear_filter();
        }
    })?;

    let revision = session.handle.snapshot().revision();
    let results = session.handle.wait_for_results(revision).await;
    match results {
        Some(results) => {
            let location = session.location();
            session.finish().await?;
            Ok((location, results))
        }
        None => {
            let end = session.finish().await?;
            bail!(not_logged_in(&end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: SearchArgs,
        }

        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.args.location, "/search");
        assert!(cli.args.min_age.is_none());
        assert!(!cli.args.clear);
    }

    #[test]
    fn test_search_args_clear_conflicts_with_min_age() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: SearchArgs,
        }

        let cli = TestCli::parse_from(["test", "-l", "?current_id=7", "--clear"]);
        assert!(cli.args.clear);
        assert_eq!(cli.args.location, "?current_id=7");

        assert!(TestCli::try_parse_from(["test", "--clear", "--min-age", "3"]).is_err());
    }
}

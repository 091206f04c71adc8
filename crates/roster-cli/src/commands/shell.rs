//! Shell command - an interactive search session.
//!
//! Each line edits the parameters or moves through history; the results for
//! the settled parameters are printed after every change.

use std::io::Write;
use std::str::FromStr;

use anyhow::{Result, bail};
use clap::Args;
use roster_core::{Location, View};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::Config;
use crate::render;
use crate::session::{Session, not_logged_in};

const HELP: &str = "\
Commands:
  filter <age>    set the minimum age (empty removes it)
  clear           remove the minimum age
  goto <location> open a location, e.g. /search?current_id=7 or /
  back            go back one location
  forward         go forward one location
  show            print the current parameters and results
  help            show this help
  quit            leave the shell";

/// Arguments for the shell command.
#[derive(Debug, Args)]
pub struct ShellArgs {
    /// Location to start at.
    #[arg(long, short = 'l', default_value = "/search")]
    pub location: String,
}

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Set (or, when blank, remove) the minimum age.
    Filter(String),
    /// Remove the minimum age.
    Clear,
    /// Open a location.
    Goto(String),
    /// Step back in history.
    Back,
    /// Step forward in history.
    Forward,
    /// Print current state.
    Show,
    /// Print help.
    Help,
    /// Leave the shell.
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word {
            "filter" | "f" => Ok(Self::Filter(rest.to_string())),
            "clear" | "c" => Ok(Self::Clear),
            "goto" | "g" if !rest.is_empty() => Ok(Self::Goto(rest.to_string())),
            "goto" | "g" => Err("goto needs a location".to_string()),
            "back" | "b" => Ok(Self::Back),
            "forward" | "fw" => Ok(Self::Forward),
            "show" | "s" => Ok(Self::Show),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (try `help`)")),
        }
    }
}

/// What the shell does after applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Wait for results of this revision and print them.
    Wait(u64),
    /// Print the current state.
    Show,
    /// Print a message.
    Message(String),
    /// The entry view was opened; the search session is over.
    Leave(Location),
    /// Leave the shell.
    Quit,
}

/// Applies `command` to the session.
///
/// Parameter edits push a history entry, as following a link would; back and
/// forward replay an entry into the parameter store.
///
/// # Errors
///
/// Returns an error if a `goto` location cannot be parsed.
pub fn apply(session: &Session, command: ShellCommand) -> Result<Step> {
    let step = match command {
        ShellCommand::Filter(min_age) => {
            let snap = session.handle.apply_filter(&min_age);
            session
                .history
                .push(Location::search(snap.params().clone()));
            Step::Wait(snap.revision())
        }
        ShellCommand::Clear => {
            let snap = session.handle.clear_filter();
            session
                .history
                .push(Location::search(snap.params().clone()));
            Step::Wait(snap.revision())
        }
        ShellCommand::Goto(input) => {
            let location = Location::parse(&input)?;
            session.history.push(location.clone());
            visit(session, location)
        }
        ShellCommand::Back => match session.history.back() {
            Some(location) => visit(session, location),
            None => Step::Message("Already at the oldest location".to_string()),
        },
        ShellCommand::Forward => match session.history.forward() {
            Some(location) => visit(session, location),
            None => Step::Message("Already at the newest location".to_string()),
        },
        ShellCommand::Show => Step::Show,
        ShellCommand::Help => Step::Message(HELP.to_string()),
        ShellCommand::Quit => Step::Quit,
    };
    Ok(step)
}

fn visit(session: &Session, location: Location) -> Step {
    match location.view {
        View::Entry => Step::Leave(location),
        View::Search => Step::Wait(session.handle.navigate(location.params).revision()),
    }
}

/// Execute the shell command.
///
/// # Errors
///
/// Returns an error if the location is invalid, stdin cannot be read, or the
/// session redirects for lack of an identity.
pub async fn execute(args: ShellArgs, config: &Config) -> Result<()> {
    let location = Location::parse(&args.location)?;
    let session = Session::start(config, config.identity_holder(), location, |_| {})?;

    let first = session.handle.snapshot().revision();
    if !print_results(&session, first, config).await? {
        return ended(session).await;
    }
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("roster> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match apply(&session, command) {
            Ok(Step::Wait(revision)) => {
                if !print_results(&session, revision, config).await? {
                    return ended(session).await;
                }
            }
            Ok(Step::Show) => {
                let results = session.handle.results();
                println!(
                    "{}",
                    render::search_results(&session.location(), &results, &config.format)?
                );
            }
            Ok(Step::Message(message)) => println!("{message}"),
            Ok(Step::Leave(location)) => {
                println!("Left the search view for {location}");
                break;
            }
            Ok(Step::Quit) => break,
            Err(e) => eprintln!("{e:#}"),
        }
    }

    session.finish().await?;
    Ok(())
}

/// Prints the results for `revision`; returns false if the session ended.
async fn print_results(session: &Session, revision: u64, config: &Config) -> Result<bool> {
    match session.handle.wait_for_results(revision).await {
        Some(results) => {
            println!(
                "{}",
                render::search_results(&session.location(), &results, &config.format)?
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn ended(session: Session) -> Result<()> {
    let end = session.finish().await?;
    bail!(not_logged_in(&end))
}

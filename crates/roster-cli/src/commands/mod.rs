//! CLI subcommands.

pub mod login;
pub mod logout;
pub mod search;
pub mod shell;
pub mod whoami;

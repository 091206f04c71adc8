//! Shared test utilities for roster integration tests.
//!
//! This crate provides:
//! - [`StubServer`]: an axum server standing in for the remote login and
//!   search services
//! - Fixture identities and rows
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_test_utils::{ScriptedResponse, StubServer, akash, sam_row};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = StubServer::builder()
//!         .user(&akash())
//!         .search("current_id=7", ScriptedResponse::json(&serde_json::json!([sam_row()])))
//!         .start()
//!         .await
//!         .unwrap();
//!     // ... point a client at server.base_url() ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod stub_server;

pub use fixtures::*;
pub use stub_server::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("roster=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

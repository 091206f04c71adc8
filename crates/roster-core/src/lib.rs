//! # roster-core
//!
//! Client-side state for roster: logging a user in and running searches whose
//! whole state lives in the address's query parameters.
//!
//! - **Identity**: the authenticated user and the [`IdentityHolder`] that
//!   persists it across restarts
//! - **Parameters**: [`QueryParams`] and the observable [`ParamStore`], the
//!   single source of truth for search state
//! - **State machine**: pure transitions between `Uninitialized` and `Ready`
//! - **Synchronizer**: the event loop that seeds the store, issues searches,
//!   and publishes results without letting stale responses win
//!
//! ## Example
//!
//! ```rust
//! use roster_core::prelude::*;
//!
//! let params = QueryParams::parse("current_id=7");
//! let params = apply_filter(&params, "25");
//! assert_eq!(params.to_query_string(), "current_id=7&min_age=25");
//!
//! let query = derive_query(&params).unwrap();
//! assert_eq!(query.min_age.as_deref(), Some("25"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod identity;
pub mod navigation;
pub mod observability;
pub mod params;
pub mod remote;
pub mod results;
pub mod state;
pub mod store;
pub mod synchronizer;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::identity::{Identity, IdentityHolder, IdentityId};
    pub use crate::navigation::{History, Location, Navigator, View};
    pub use crate::params::{CURRENT_ID, MIN_AGE, ParamStore, QueryParams, Snapshot};
    pub use crate::remote::{AuthService, LoginError, SearchService, login};
    pub use crate::results::{ResultRow, ResultSet, ResultStatus};
    pub use crate::state::{
        SearchQuery, SearchState, Transition, apply_filter, clear_filter, derive_query,
    };
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore};
    pub use crate::synchronizer::{SearchHandle, SearchSynchronizer, SessionEnd};
}

pub use error::{Error, Result};
pub use identity::{Identity, IdentityHolder, IdentityId};
pub use navigation::{History, Location, Navigator, View};
pub use observability::{LogFormat, init_logging};
pub use params::{ParamStore, QueryParams, Snapshot};
pub use remote::{AuthService, LoginError, SearchService};
pub use results::{ResultRow, ResultSet, ResultStatus};
pub use state::{SearchQuery, SearchState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use synchronizer::{SearchHandle, SearchSynchronizer, SessionEnd};

//! Wiring for a search session: identity, HTTP client, history and the
//! synchronizer task.

use std::sync::Arc;

use anyhow::{Result, bail};
use roster_core::observability::session_span;
use roster_core::{
    History, IdentityHolder, Location, Navigator, ParamStore, SearchHandle, SearchState,
    SearchSynchronizer, SessionEnd, View,
};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::Config;
use crate::client::ApiClient;

/// A running search session.
#[derive(Debug)]
pub struct Session {
    /// Editing and observation surface.
    pub handle: SearchHandle,
    /// Navigation history, starting at the session's location.
    pub history: Arc<History>,
    task: JoinHandle<SessionEnd>,
}

impl Session {
    /// Builds a session at `location` and applies `prepare` to the handle
    /// before the synchronizer evaluates the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `location` is not the search view or the HTTP client
    /// cannot be built.
    pub fn start(
        config: &Config,
        holder: Arc<IdentityHolder>,
        location: Location,
        prepare: impl FnOnce(&SearchHandle),
    ) -> Result<Self> {
        if location.view != View::Search {
            bail!("Not a search location: {location}");
        }

        let client = Arc::new(ApiClient::new(config)?);
        let history = Arc::new(History::starting_at(location.clone()));
        let (synchronizer, handle) = SearchSynchronizer::new(
            holder,
            client,
            Arc::clone(&history) as Arc<dyn Navigator>,
            ParamStore::new(location.params.clone()),
        );
        prepare(&handle);
        track_history(&handle, Arc::clone(&history));

        let span = session_span(&location.to_string());
        let task = tokio::spawn(synchronizer.run().instrument(span));

        Ok(Self {
            handle,
            history,
            task,
        })
    }

    /// The location currently shown: the search view with the current
    /// parameters.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::search(self.handle.snapshot().params().clone())
    }

    /// Drops the handle and waits for the synchronizer to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the synchronizer task panicked.
    pub async fn finish(self) -> Result<SessionEnd> {
        let Self { handle, task, .. } = self;
        drop(handle);
        Ok(task.await?)
    }
}

/// Rewrites the current history entry once the synchronizer seeds it, so
/// back/forward return to what was shown.
fn track_history(handle: &SearchHandle, history: Arc<History>) {
    let mut rx = handle.subscribe_params();
    let initial = rx.borrow_and_update().params().clone();
    history.replace(Location::search(initial));
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let params = rx.borrow_and_update().params().clone();
            let unseeded = history.current().is_some_and(|l| {
                l.view == View::Search && !SearchState::from_params(&l.params).is_ready()
            });
            if unseeded {
                history.replace(Location::search(params));
            }
        }
    });
}

/// The message shown when a session ends without an identity.
#[must_use]
pub fn not_logged_in(end: &SessionEnd) -> String {
    match end {
        SessionEnd::Redirected(location) => {
            format!("Not logged in (redirected to {location}). Run `roster login <name>` first.")
        }
        SessionEnd::Closed => "Search session closed".to_string(),
    }
}

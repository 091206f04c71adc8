//! The search synchronizer.
//!
//! Keeps three things consistent: the parameter store, the identity held by
//! the [`IdentityHolder`], and the result collection produced by remote
//! searches.
//!
//! The synchronizer subscribes once to the [`ParamStore`] and reacts to two
//! kinds of events on a single task: parameter-store replacements and fetch
//! completions. For every replacement it evaluates the snapshot with
//! [`state::on_entry`]:
//!
//! - **Ready** snapshots abort any in-flight fetch and start a new one tagged
//!   with the snapshot revision.
//! - **Uninitialized** snapshots are seeded with the held identity (which
//!   produces another replacement), or, with no identity, end the session
//!   with a redirect to the entry view.
//!
//! A completed fetch is published only if its revision is still the newest
//! snapshot seen and is newer than the displayed results, so a late response
//! from an older snapshot can never overwrite a newer one. Failed fetches
//! publish an empty collection; the parameters are never rolled back.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, warn};

use crate::error::Result;
use crate::identity::IdentityHolder;
use crate::navigation::{Location, Navigator};
use crate::observability::fetch_span;
use crate::params::{ParamStore, QueryParams, Snapshot, WeakParamStore};
use crate::remote::SearchService;
use crate::results::{ResultSet, normalize_rows};
use crate::state::{self, SearchQuery, SearchState, Transition};

/// Why a synchronizer session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// No identity was available; the navigator was sent to this location.
    Redirected(Location),
    /// Every handle to the parameter store was dropped.
    Closed,
}

struct FetchOutcome {
    revision: u64,
    query: SearchQuery,
    body: Result<serde_json::Value>,
}

/// Reconciles the parameter store, the identity, and remote search results.
pub struct SearchSynchronizer {
    holder: Arc<IdentityHolder>,
    search: Arc<dyn SearchService>,
    navigator: Arc<dyn Navigator>,
    params: WeakParamStore,
    params_rx: watch::Receiver<Snapshot>,
    results_tx: watch::Sender<ResultSet>,
    latest_revision: u64,
}

impl std::fmt::Debug for SearchSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSynchronizer")
            .field("latest_revision", &self.latest_revision)
            .finish_non_exhaustive()
    }
}

impl SearchSynchronizer {
    /// Creates a synchronizer over `params` and the handle used to edit it.
    ///
    /// The synchronizer only keeps a weak reference to the store; once every
    /// [`SearchHandle`] (and any other clone of `params`) is dropped, [`run`]
    /// ends with [`SessionEnd::Closed`].
    ///
    /// [`run`]: SearchSynchronizer::run
    #[must_use]
    pub fn new(
        holder: Arc<IdentityHolder>,
        search: Arc<dyn SearchService>,
        navigator: Arc<dyn Navigator>,
        params: ParamStore,
    ) -> (Self, SearchHandle) {
        let (results_tx, results_rx) = watch::channel(ResultSet::default());
        let synchronizer = Self {
            holder,
            search,
            navigator,
            params: params.downgrade(),
            params_rx: params.subscribe(),
            results_tx,
            latest_revision: 0,
        };
        let handle = SearchHandle {
            params,
            results: results_rx,
        };
        (synchronizer, handle)
    }

    /// Drives the session until it redirects or is closed.
    ///
    /// The current snapshot is evaluated immediately; afterwards every
    /// replacement of the store is evaluated as a unit.
    pub async fn run(mut self) -> SessionEnd {
        let mut fetches: JoinSet<FetchOutcome> = JoinSet::new();

        let initial = self.params_rx.borrow_and_update().clone();
        if let Some(end) = self.reconcile(&initial, &mut fetches) {
            return end;
        }

        loop {
            tokio::select! {
                changed = self.params_rx.changed() => {
                    if changed.is_err() {
                        fetches.abort_all();
                        debug!("parameter store dropped, closing session");
                        return SessionEnd::Closed;
                    }
                    let snapshot = self.params_rx.borrow_and_update().clone();
                    if let Some(end) = self.reconcile(&snapshot, &mut fetches) {
                        fetches.abort_all();
                        return end;
                    }
                }
                Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                    match joined {
                        Ok(outcome) => self.publish(outcome),
                        Err(e) if e.is_cancelled() => debug!("superseded fetch cancelled"),
                        Err(e) => warn!(error = %e, "fetch task failed"),
                    }
                }
            }
        }
    }

    fn reconcile(
        &mut self,
        snapshot: &Snapshot,
        fetches: &mut JoinSet<FetchOutcome>,
    ) -> Option<SessionEnd> {
        let revision = snapshot.revision();
        self.latest_revision = revision;
        // Whatever is in flight now belongs to an older snapshot.
        fetches.abort_all();

        let params = snapshot.params();
        let identity = if SearchState::from_params(params).is_ready() {
            None
        } else {
            self.holder.get()
        };

        match state::on_entry(params, identity.as_ref()) {
            Transition::Fetch(query) => {
                info!(revision, query = %query.to_query_string(), "issuing search");
                let search = Arc::clone(&self.search);
                let span = fetch_span(revision, &query.current_id);
                fetches.spawn(
                    async move {
                        let body = search.search(&query).await;
                        FetchOutcome {
                            revision,
                            query,
                            body,
                        }
                    }
                    .instrument(span),
                );
                None
            }
            Transition::Seed(_) => {
                let Some(store) = self.params.upgrade() else {
                    return Some(SessionEnd::Closed);
                };
                if let Some(identity) = &identity {
                    debug!(revision, current_id = %identity.id, "seeding current_id");
                    // Merge into whatever the store holds now, not the evaluated snapshot.
                    store.update(|prev| state::seed_if_missing(prev, identity));
                }
                None
            }
            Transition::Redirect(location) => {
                info!(revision, %location, "no identity available, redirecting");
                self.navigator.navigate(location.clone());
                Some(SessionEnd::Redirected(location))
            }
        }
    }

    fn publish(&self, outcome: FetchOutcome) {
        let FetchOutcome {
            revision,
            query,
            body,
        } = outcome;

        if revision != self.latest_revision {
            debug!(
                revision,
                latest = self.latest_revision,
                "discarding response for superseded snapshot"
            );
            return;
        }

        let next = match body {
            Ok(body) => {
                let rows = normalize_rows(body);
                info!(revision, rows = rows.len(), "search completed");
                ResultSet::loaded(revision, rows)
            }
            Err(e) => {
                warn!(
                    revision,
                    query = %query.to_query_string(),
                    error = %e,
                    "search failed, clearing results"
                );
                ResultSet::failed(revision)
            }
        };

        self.results_tx.send_if_modified(|current| {
            if current.accepts(next.revision) {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

/// Editing and observation surface for the human-facing layer.
///
/// Every edit is a whole replacement of the parameter store that keeps all
/// unrelated keys.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    params: ParamStore,
    results: watch::Receiver<ResultSet>,
}

impl SearchHandle {
    /// Sets `min_age`, or removes it when `min_age` is blank.
    pub fn apply_filter(&self, min_age: &str) -> Snapshot {
        self.params.update(|prev| state::apply_filter(prev, min_age))
    }

    /// Removes `min_age`.
    pub fn clear_filter(&self) -> Snapshot {
        self.params.update(state::clear_filter)
    }

    /// Replaces the parameters wholesale, as an external address change does
    /// (back/forward navigation, a pasted link).
    pub fn navigate(&self, params: QueryParams) -> Snapshot {
        self.params.replace(params)
    }

    /// The current parameter snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.params.snapshot()
    }

    /// Subscribes to parameter replacements.
    #[must_use]
    pub fn subscribe_params(&self) -> watch::Receiver<Snapshot> {
        self.params.subscribe()
    }

    /// The currently displayed results.
    #[must_use]
    pub fn results(&self) -> ResultSet {
        self.results.borrow().clone()
    }

    /// Subscribes to result updates.
    #[must_use]
    pub fn subscribe_results(&self) -> watch::Receiver<ResultSet> {
        self.results.clone()
    }

    /// Waits until results for `revision` (or a newer snapshot) are displayed.
    ///
    /// Returns `None` if the session ends first.
    pub async fn wait_for_results(&self, revision: u64) -> Option<ResultSet> {
        let mut rx = self.results.clone();
        rx.wait_for(|set| set.revision >= revision)
            .await
            .ok()
            .map(|set| set.clone())
    }
}

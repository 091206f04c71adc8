//! Navigation contract between the synchronizer and whatever hosts it.
//!
//! Two views exist, addressed by path: the entry/login view at `/` and the
//! search view at `/search`. The search view is only meaningful with a
//! `current_id` in its own query string.

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::QueryParams;

/// A client view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Entry/login view.
    Entry,
    /// Search view.
    Search,
}

impl View {
    /// Path addressing this view.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Entry => "/",
            Self::Search => "/search",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Entry),
            "/search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// A view plus its query parameters; the client's "address bar".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Addressed view.
    pub view: View,
    /// Query parameters of the address.
    pub params: QueryParams,
}

impl Location {
    /// The entry/login view with no parameters.
    #[must_use]
    pub fn entry() -> Self {
        Self {
            view: View::Entry,
            params: QueryParams::new(),
        }
    }

    /// The search view with `params`.
    #[must_use]
    pub fn search(params: QueryParams) -> Self {
        Self {
            view: View::Search,
            params,
        }
    }

    /// Parses `/search?current_id=7`, a bare query (`?min_age=30`, read as
    /// the search view), or a full URL such as a shared link.
    ///
    /// # Errors
    ///
    /// Returns an error if the path addresses no known view or the URL is
    /// malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.contains("://") {
            let url = url::Url::parse(input)
                .map_err(|e| Error::InvalidInput(format!("invalid url {input:?}: {e}")))?;
            return Self::from_parts(url.path(), url.query().unwrap_or_default());
        }

        if let Some(query) = input.strip_prefix('?') {
            return Ok(Self::search(QueryParams::parse(query)));
        }

        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        Self::from_parts(path, query)
    }

    fn from_parts(path: &str, query: &str) -> Result<Self> {
        let view = View::from_path(path)
            .ok_or_else(|| Error::InvalidInput(format!("unknown view path: {path:?}")))?;
        Ok(Self {
            view,
            params: QueryParams::parse(query),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.view.path())?;
        if !self.params.is_empty() {
            write!(f, "?{}", self.params)?;
        }
        Ok(())
    }
}

/// Receives navigation requests from the synchronizer and the login flow.
pub trait Navigator: Send + Sync {
    /// Moves the client to `location`.
    fn navigate(&self, location: Location);
}

/// In-memory back/forward history.
#[derive(Debug, Default)]
pub struct History {
    state: RwLock<HistoryState>,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history whose only entry is `location`.
    #[must_use]
    pub fn starting_at(location: Location) -> Self {
        let history = Self::new();
        history.push(location);
        history
    }

    /// Pushes `location`, discarding any forward entries.
    pub fn push(&self, location: Location) {
        let mut state = self.write();
        if !state.entries.is_empty() {
            let keep = state.index + 1;
            state.entries.truncate(keep);
        }
        state.entries.push(location);
        state.index = state.entries.len() - 1;
    }

    /// Replaces the current entry without adding history.
    pub fn replace(&self, location: Location) {
        let mut state = self.write();
        let index = state.index;
        match state.entries.get_mut(index) {
            Some(entry) => *entry = location,
            None => state.entries.push(location),
        }
    }

    /// Returns the current entry.
    #[must_use]
    pub fn current(&self) -> Option<Location> {
        let state = self.read();
        state.entries.get(state.index).cloned()
    }

    /// Steps back one entry, returning the new current entry.
    pub fn back(&self) -> Option<Location> {
        let mut state = self.write();
        if state.index == 0 {
            return None;
        }
        state.index -= 1;
        state.entries.get(state.index).cloned()
    }

    /// Steps forward one entry, returning the new current entry.
    pub fn forward(&self) -> Option<Location> {
        let mut state = self.write();
        if state.index + 1 >= state.entries.len() {
            return None;
        }
        state.index += 1;
        state.entries.get(state.index).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HistoryState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HistoryState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for History {
    fn navigate(&self, location: Location) {
        debug!(%location, "navigate");
        self.push(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CURRENT_ID, MIN_AGE};

    #[test]
    fn parse_paths() {
        let entry = Location::parse("/").expect("entry");
        assert_eq!(entry.view, View::Entry);

        let search = Location::parse("/search?current_id=7&min_age=25").expect("search");
        assert_eq!(search.view, View::Search);
        assert_eq!(search.params.get(CURRENT_ID), Some("7"));
        assert_eq!(search.params.get(MIN_AGE), Some("25"));

        let trailing = Location::parse("/search/").expect("trailing slash");
        assert_eq!(trailing.view, View::Search);
    }

    #[test]
    fn parse_bare_query_targets_search() {
        let location = Location::parse("?min_age=30").expect("bare query");
        assert_eq!(location.view, View::Search);
        assert!(!location.params.contains(CURRENT_ID));
    }

    #[test]
    fn parse_full_url() {
        let location =
            Location::parse("http://localhost:3000/search?current_id=7").expect("shared link");
        assert_eq!(location.to_string(), "/search?current_id=7");
    }

    #[test]
    fn parse_rejects_unknown_path() {
        assert!(matches!(
            Location::parse("/admin"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn display_omits_empty_query() {
        assert_eq!(Location::entry().to_string(), "/");
        assert_eq!(Location::search(QueryParams::new()).to_string(), "/search");
    }

    #[test]
    fn history_back_and_forward() {
        let history = History::starting_at(Location::entry());
        history.navigate(Location::parse("/search?current_id=7").expect("parse"));
        history.navigate(Location::parse("/search?current_id=7&min_age=25").expect("parse"));

        assert_eq!(
            history.back().map(|l| l.to_string()).as_deref(),
            Some("/search?current_id=7")
        );
        assert_eq!(history.back().map(|l| l.to_string()).as_deref(), Some("/"));
        assert!(history.back().is_none());

        assert_eq!(
            history.forward().map(|l| l.to_string()).as_deref(),
            Some("/search?current_id=7")
        );

        // pushing from the middle drops the forward entries
        history.push(Location::entry());
        assert!(history.forward().is_none());
        assert_eq!(history.current(), Some(Location::entry()));
    }

    #[test]
    fn history_replace_does_not_grow() {
        let history = History::new();
        history.replace(Location::entry());
        history.replace(Location::search(QueryParams::parse("current_id=1")));
        assert!(history.back().is_none());
        assert_eq!(
            history.current().map(|l| l.to_string()).as_deref(),
            Some("/search?current_id=1")
        );
    }
}

//! The parameter store: query parameters as the single source of truth for
//! search state.
//!
//! [`QueryParams`] is an immutable, ordered list of key/value pairs with the
//! same semantics as a browser's `URLSearchParams`. Every edit produces a new
//! value. [`ParamStore`] holds the current [`Snapshot`] and publishes each
//! whole replacement to subscribers through a `tokio::sync::watch` channel, so
//! two rapid edits can never interleave into a half-applied state.

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use url::form_urlencoded;

/// Identity reference parameter; required for any search.
pub const CURRENT_ID: &str = "current_id";
/// Optional minimum age filter parameter.
pub const MIN_AGE: &str = "min_age";

/// Ordered string-to-string query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    ///
    /// ```rust
    /// use roster_core::params::QueryParams;
    ///
    /// let params = QueryParams::parse("?current_id=7&min_age=25");
    /// assert_eq!(params.get("min_age"), Some("25"));
    /// ```
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `key` is present (even with an empty value).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Returns a copy with `key` set to `value`.
    ///
    /// The first occurrence keeps its position; later duplicates are dropped.
    /// A missing key is appended.
    #[must_use]
    pub fn with_set(&self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let mut pairs = Vec::with_capacity(self.pairs.len() + 1);
        let mut replaced = false;

        for (k, v) in &self.pairs {
            if k == key {
                if !replaced {
                    pairs.push((k.clone(), value.clone()));
                    replaced = true;
                }
            } else {
                pairs.push((k.clone(), v.clone()));
            }
        }
        if !replaced {
            pairs.push((key.to_string(), value));
        }

        Self { pairs }
    }

    /// Returns a copy with every occurrence of `key` removed.
    #[must_use]
    pub fn with_removed(&self, key: &str) -> Self {
        Self {
            pairs: self
                .pairs
                .iter()
                .filter(|(k, _)| k != key)
                .cloned()
                .collect(),
        }
    }

    /// Iterates over the pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encodes the parameters as a query string without the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An immutable copy of the store's content at one instant.
///
/// The revision increases by one with every replacement and is used to tag
/// in-flight fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    revision: u64,
    params: Arc<QueryParams>,
}

impl Snapshot {
    /// Revision of this snapshot.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Parameters captured by this snapshot.
    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

/// Shared, observable parameter store.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct ParamStore {
    tx: Arc<watch::Sender<Snapshot>>,
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(QueryParams::default())
    }
}

impl ParamStore {
    /// Creates a store holding `initial` at revision 1.
    ///
    /// Revision 0 is never published; it marks "no snapshot yet" elsewhere.
    #[must_use]
    pub fn new(initial: QueryParams) -> Self {
        let (tx, _rx) = watch::channel(Snapshot {
            revision: 1,
            params: Arc::new(initial),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Replaces the whole content, returning the new snapshot.
    pub fn replace(&self, params: QueryParams) -> Snapshot {
        self.update(move |_| params)
    }

    /// Replaces the content with `f(previous)`, returning the new snapshot.
    ///
    /// The read of the previous value and the write of the next one happen
    /// under the channel lock, so concurrent updates are serialized.
    pub fn update(&self, f: impl FnOnce(&QueryParams) -> QueryParams) -> Snapshot {
        let mut published = Snapshot::default();
        self.tx.send_modify(|current| {
            let next = f(&current.params);
            *current = Snapshot {
                revision: current.revision + 1,
                params: Arc::new(next),
            };
            published = current.clone();
        });
        published
    }

    /// Subscribes to replacements. The current snapshot is marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Creates a handle that does not keep the store alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakParamStore {
        WeakParamStore {
            tx: Arc::downgrade(&self.tx),
        }
    }
}

/// Non-owning reference to a [`ParamStore`].
///
/// Subscribers see the channel close once every strong handle is gone.
#[derive(Debug, Clone)]
pub struct WeakParamStore {
    tx: Weak<watch::Sender<Snapshot>>,
}

impl WeakParamStore {
    /// Returns the store if any strong handle is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ParamStore> {
        self.tx.upgrade().map(|tx| ParamStore { tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_leading_question_mark_and_decodes() {
        let params = QueryParams::parse("?current_id=7&name=Sam+Lee&tag=a%26b");
        assert_eq!(params.get(CURRENT_ID), Some("7"));
        assert_eq!(params.get("name"), Some("Sam Lee"));
        assert_eq!(params.get("tag"), Some("a&b"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_value_is_present() {
        let params = QueryParams::parse("min_age=");
        assert!(params.contains(MIN_AGE));
        assert_eq!(params.get(MIN_AGE), Some(""));
    }

    #[test]
    fn with_set_keeps_position_and_drops_duplicates() {
        let params = QueryParams::parse("a=1&b=2&a=3");
        let next = params.with_set("a", "9");
        assert_eq!(next.to_query_string(), "a=9&b=2");
        // input untouched
        assert_eq!(params.to_query_string(), "a=1&b=2&a=3");
    }

    #[test]
    fn with_set_appends_missing_key() {
        let params = QueryParams::parse("current_id=7");
        assert_eq!(
            params.with_set(MIN_AGE, "25").to_query_string(),
            "current_id=7&min_age=25"
        );
    }

    #[test]
    fn with_removed_removes_every_occurrence() {
        let params = QueryParams::parse("min_age=1&current_id=5&min_age=2");
        assert_eq!(params.with_removed(MIN_AGE).to_query_string(), "current_id=5");
    }

    #[test]
    fn store_bumps_revision_on_every_replacement() {
        let store = ParamStore::default();
        assert_eq!(store.snapshot().revision(), 1);

        let first = store.replace(QueryParams::parse("current_id=1"));
        let second = store.replace(QueryParams::parse("current_id=1"));
        assert_eq!(first.revision(), 2);
        assert_eq!(second.revision(), 3);
        assert_eq!(first.params(), second.params());
    }

    #[test]
    fn update_reads_previous_snapshot() {
        let store = ParamStore::new(QueryParams::parse("foo=bar"));
        let snap = store.update(|prev| prev.with_set(CURRENT_ID, "7"));
        assert_eq!(snap.params().to_query_string(), "foo=bar&current_id=7");
        assert_eq!(store.snapshot(), snap);
    }

    #[tokio::test]
    async fn subscribers_are_notified() {
        let store = ParamStore::default();
        let mut rx = store.subscribe();

        store.replace(QueryParams::parse("current_id=3"));
        rx.changed().await.expect("store alive");
        assert_eq!(rx.borrow_and_update().params().get(CURRENT_ID), Some("3"));
    }

    #[tokio::test]
    async fn channel_closes_when_last_strong_handle_drops() {
        let store = ParamStore::default();
        let weak = store.downgrade();
        let mut rx = store.subscribe();

        assert!(weak.upgrade().is_some());
        drop(store);
        assert!(weak.upgrade().is_none());
        assert!(rx.changed().await.is_err());
    }
}

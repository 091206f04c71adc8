//! Explicit search state machine.
//!
//! The state is derived from the parameter store alone: without a usable
//! `current_id` the search view is [`SearchState::Uninitialized`], with one it
//! is [`SearchState::Ready`]. Transitions are pure functions from parameters
//! (plus the available identity) to new parameters or a side effect to
//! perform; the [`synchronizer`](crate::synchronizer) executes those effects.

use crate::identity::Identity;
use crate::navigation::Location;
use crate::params::{CURRENT_ID, MIN_AGE, QueryParams};

/// Search view state derived from the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// No identity reference in the store.
    Uninitialized,
    /// Identity reference present; searches may be issued.
    Ready {
        /// The `current_id` parameter value.
        current_id: String,
    },
}

impl SearchState {
    /// Derives the state from `params`. A blank `current_id` counts as missing.
    #[must_use]
    pub fn from_params(params: &QueryParams) -> Self {
        match params.get(CURRENT_ID) {
            Some(id) if !id.trim().is_empty() => Self::Ready {
                current_id: id.to_string(),
            },
            _ => Self::Uninitialized,
        }
    }

    /// Returns true for [`SearchState::Ready`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// A remote search request derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    /// Identity reference, passed verbatim.
    pub current_id: String,
    /// Minimum age filter, only when present and non-blank.
    pub min_age: Option<String>,
}

impl SearchQuery {
    /// Query-string pairs in wire order: `current_id`, then `min_age`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![(CURRENT_ID, self.current_id.as_str())];
        if let Some(min_age) = &self.min_age {
            pairs.push((MIN_AGE, min_age.as_str()));
        }
        pairs
    }

    /// Encoded query string, e.g. `current_id=7&min_age=25`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .into_iter()
            .collect::<QueryParams>()
            .to_query_string()
    }
}

/// Outcome of evaluating a snapshot on entry to, or change within, the search view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Ready: issue this search.
    Fetch(SearchQuery),
    /// Uninitialized with an identity: replace the store with these parameters.
    Seed(QueryParams),
    /// Uninitialized without an identity: go to this location instead.
    Redirect(Location),
}

/// Evaluates `params` against the available identity.
#[must_use]
pub fn on_entry(params: &QueryParams, identity: Option<&Identity>) -> Transition {
    if let Some(query) = derive_query(params) {
        return Transition::Fetch(query);
    }

    match identity {
        Some(identity) if !identity.id.is_blank() => Transition::Seed(seed(params, identity)),
        _ => Transition::Redirect(Location::entry()),
    }
}

/// Writes the identity reference into `params`, preserving every other key.
///
/// Idempotent: seeding twice with the same identity equals seeding once.
#[must_use]
pub fn seed(params: &QueryParams, identity: &Identity) -> QueryParams {
    params.with_set(CURRENT_ID, identity.current_id())
}

/// Like [`seed`], but leaves `params` unchanged when they already carry a
/// usable `current_id`.
#[must_use]
pub fn seed_if_missing(params: &QueryParams, identity: &Identity) -> QueryParams {
    if SearchState::from_params(params).is_ready() {
        params.clone()
    } else {
        seed(params, identity)
    }
}

/// Sets `min_age` when non-blank, removes it otherwise. Other keys are kept.
#[must_use]
pub fn apply_filter(params: &QueryParams, min_age: &str) -> QueryParams {
    let min_age = min_age.trim();
    if min_age.is_empty() {
        params.with_removed(MIN_AGE)
    } else {
        params.with_set(MIN_AGE, min_age)
    }
}

/// Removes `min_age` unconditionally. Other keys are kept.
#[must_use]
pub fn clear_filter(params: &QueryParams) -> QueryParams {
    params.with_removed(MIN_AGE)
}

/// Derives the remote query for `params`, or `None` when there is no usable
/// `current_id`.
///
/// A `min_age` that is blank after trimming is treated as absent, even though
/// the key may still be stored.
#[must_use]
pub fn derive_query(params: &QueryParams) -> Option<SearchQuery> {
    let SearchState::Ready { current_id } = SearchState::from_params(params) else {
        return None;
    };

    let min_age = params
        .get(MIN_AGE)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Some(SearchQuery {
        current_id,
        min_age,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::View;
    use proptest::prelude::*;

    fn identity(id: i64) -> Identity {
        Identity::new(id, "user", "p")
    }

    #[test]
    fn state_from_params() {
        assert_eq!(
            SearchState::from_params(&QueryParams::parse("min_age=30")),
            SearchState::Uninitialized
        );
        assert_eq!(
            SearchState::from_params(&QueryParams::parse("current_id=%20")),
            SearchState::Uninitialized
        );
        assert!(SearchState::from_params(&QueryParams::parse("current_id=5")).is_ready());
    }

    #[test]
    fn apply_filter_merges() {
        let params = QueryParams::parse("foo=bar");
        let next = apply_filter(&params, "30");
        assert_eq!(next.get("foo"), Some("bar"));
        assert_eq!(next.get(MIN_AGE), Some("30"));
    }

    #[test]
    fn apply_empty_filter_removes_key() {
        let params = QueryParams::parse("current_id=7&min_age=30");
        assert_eq!(apply_filter(&params, "").to_query_string(), "current_id=7");
        assert_eq!(apply_filter(&params, "  ").to_query_string(), "current_id=7");
    }

    #[test]
    fn clear_filter_leaves_only_other_keys() {
        let params = QueryParams::parse("min_age=30&current_id=5");
        assert_eq!(clear_filter(&params).to_query_string(), "current_id=5");
    }

    #[test]
    fn derivation_ignores_empty_min_age() {
        let query = derive_query(&QueryParams::parse("current_id=7&min_age=")).expect("ready");
        assert_eq!(query.min_age, None);
        assert_eq!(query.to_query_string(), "current_id=7");
    }

    #[test]
    fn derivation_includes_min_age_and_ignores_unknown_keys() {
        let query =
            derive_query(&QueryParams::parse("foo=bar&min_age=25&current_id=7")).expect("ready");
        assert_eq!(query.to_query_string(), "current_id=7&min_age=25");
    }

    #[test]
    fn derivation_requires_current_id() {
        assert_eq!(derive_query(&QueryParams::parse("min_age=30")), None);
    }

    #[test]
    fn on_entry_seeds_when_identity_known() {
        let params = QueryParams::parse("min_age=30");
        let transition = on_entry(&params, Some(&identity(7)));
        let Transition::Seed(seeded) = &transition else {
            panic!("expected seed, got {transition:?}");
        };
        assert_eq!(seeded.to_query_string(), "min_age=30&current_id=7");
    }

    #[test]
    fn seed_if_missing_keeps_a_current_id_that_arrived_meanwhile() {
        let navigated = QueryParams::parse("current_id=9&min_age=30");
        assert_eq!(seed_if_missing(&navigated, &identity(7)), navigated);

        let blank = QueryParams::parse("current_id=&min_age=30");
        assert_eq!(
            seed_if_missing(&blank, &identity(7)).to_query_string(),
            "current_id=7&min_age=30"
        );
    }

    #[test]
    fn on_entry_redirects_without_identity() {
        let transition = on_entry(&QueryParams::parse("min_age=30"), None);
        let Transition::Redirect(location) = &transition else {
            panic!("expected redirect, got {transition:?}");
        };
        assert_eq!(location.view, View::Entry);
    }

    #[test]
    fn on_entry_fetches_when_ready_regardless_of_identity() {
        let transition = on_entry(&QueryParams::parse("current_id=9"), None);
        assert!(matches!(transition, Transition::Fetch(q) if q.current_id == "9"));
    }

    fn params_strategy() -> impl Strategy<Value = QueryParams> {
        prop::collection::vec(
            (
                prop_oneof![
                    Just(CURRENT_ID.to_string()),
                    Just(MIN_AGE.to_string()),
                    "[a-z]{1,6}",
                ],
                "[a-z0-9 ]{0,6}",
            ),
            0..8,
        )
        .prop_map(|pairs| pairs.into_iter().collect::<QueryParams>())
    }

    proptest! {
        #[test]
        fn seeding_is_idempotent(params in params_strategy(), id in 0i64..10_000) {
            let identity = identity(id);
            let once = seed(&params, &identity);
            let twice = seed(&once, &identity);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn apply_filter_never_drops_other_keys(params in params_strategy(), min_age in "[0-9]{0,3}") {
            let next = apply_filter(&params, &min_age);
            for (key, _) in params.iter().filter(|(k, _)| *k != MIN_AGE) {
                prop_assert_eq!(next.get(key), params.get(key));
            }
            prop_assert_eq!(next.contains(MIN_AGE), !min_age.is_empty());
        }

        #[test]
        fn blank_min_age_derives_no_filter(
            params in params_strategy(),
            id in 1i64..10_000,
            blank in "[ \t]{0,4}",
        ) {
            let params = params
                .with_set(CURRENT_ID, id.to_string())
                .with_set(MIN_AGE, blank);
            let query = derive_query(&params).expect("current_id is set");
            prop_assert_eq!(query.min_age, None);
            prop_assert_eq!(query.current_id, id.to_string());
        }

        #[test]
        fn redirect_never_fetches(params in params_strategy()) {
            let params = params.with_removed(CURRENT_ID);
            prop_assert_eq!(on_entry(&params, None), Transition::Redirect(Location::entry()));
        }
    }
}

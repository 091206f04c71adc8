//! The authenticated identity and its holder.
//!
//! An [`Identity`] is created by a successful login and owned exclusively by an
//! [`IdentityHolder`]. The holder has an explicit lifecycle: it is loaded once
//! at startup from a [`KeyValueStore`], and saved or cleared on demand. It is
//! passed into the synchronizer at construction instead of being reached
//! through ambient global state.
//!
//! Only [`Identity::id`] is read by the rest of the crate; `name` and `permid`
//! are carried for display and round-tripping.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::KeyValueStore;

/// Identifier of an authenticated user.
///
/// The remote service may send the id as a JSON number or string; both are
/// accepted and [`Display`](fmt::Display) yields the form written into the
/// `current_id` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityId {
    /// Numeric id, e.g. `7`.
    Number(serde_json::Number),
    /// Textual id, e.g. `"u-7"`.
    Text(String),
}

impl IdentityId {
    /// Returns true if the id carries no usable value (blank text).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IdentityId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for IdentityId {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// The authenticated user record returned by `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// User id; the value published as `current_id`.
    pub id: IdentityId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Permission reference. Opaque: a string or a list of permitted ids.
    #[serde(default)]
    pub permid: serde_json::Value,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(
        id: impl Into<IdentityId>,
        name: impl Into<String>,
        permid: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permid: permid.into(),
        }
    }

    /// The `current_id` parameter value for this identity.
    #[must_use]
    pub fn current_id(&self) -> String {
        self.id.to_string()
    }
}

/// Owns the current identity and its persisted copy.
pub struct IdentityHolder {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Identity>>,
}

impl fmt::Debug for IdentityHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityHolder")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

impl IdentityHolder {
    /// Key under which the identity is persisted.
    pub const STORAGE_KEY: &'static str = "user";

    /// Loads the persisted identity from `store`.
    ///
    /// Never fails: unavailable storage or unparseable content is logged and
    /// treated as "no identity".
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let current = read_persisted(store.as_ref());
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    /// Returns the current identity, if any.
    #[must_use]
    pub fn get(&self) -> Option<Identity> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the current identity and its persisted copy.
    ///
    /// `None` clears both. The in-memory value is updated even if persisting
    /// fails, so the running session keeps working.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set(&self, identity: Option<Identity>) -> Result<()> {
        let persisted = match &identity {
            Some(identity) => {
                let raw = serde_json::to_string(identity)?;
                self.store.set(Self::STORAGE_KEY, &raw)
            }
            None => self.store.remove(Self::STORAGE_KEY),
        };

        debug!(present = identity.is_some(), "identity replaced");
        match self.current.write() {
            Ok(mut guard) => *guard = identity,
            Err(poisoned) => *poisoned.into_inner() = identity,
        }

        persisted
    }

    /// Re-reads the persisted identity, replacing the current value.
    pub fn reload(&self) -> Option<Identity> {
        let identity = read_persisted(self.store.as_ref());
        match self.current.write() {
            Ok(mut guard) => guard.clone_from(&identity),
            Err(poisoned) => poisoned.into_inner().clone_from(&identity),
        }
        identity
    }
}

fn read_persisted(store: &dyn KeyValueStore) -> Option<Identity> {
    let raw = match store.get(IdentityHolder::STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "identity storage unavailable, treating as logged out");
            return None;
        }
    };

    match serde_json::from_str::<Identity>(&raw) {
        Ok(identity) if !identity.id.is_blank() => Some(identity),
        Ok(_) => {
            warn!("persisted identity has a blank id, treating as logged out");
            None
        }
        Err(e) => {
            warn!(error = %e, "persisted identity is not parseable, treating as logged out");
            None
        }
    }
}

//! Boundaries to the remote authentication and search services, and the login
//! flow built on them.
//!
//! The HTTP implementations live in `roster-cli`; tests substitute their own.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::identity::{Identity, IdentityHolder};
use crate::navigation::Location;
use crate::params::QueryParams;
use crate::state::{SearchQuery, seed};

/// Login failures. Each variant is shown to the user as a distinct message.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// No name was entered; nothing was sent.
    #[error("Enter a name")]
    MissingName,

    /// The service answered with a non-success status.
    #[error("Login failed (status {status})")]
    Rejected {
        /// HTTP status returned by the service.
        status: u16,
    },

    /// The service could not be reached.
    #[error("Network error: {message}")]
    Network {
        /// Transport failure description.
        message: String,
    },

    /// The service answered success but the body is not an identity.
    #[error("Login failed: unexpected response ({message})")]
    InvalidResponse {
        /// Decoding failure description.
        message: String,
    },
}

/// Remote authentication: `POST /login`.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Authenticates `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Rejected`] for non-success statuses and
    /// [`LoginError::Network`] for transport failures.
    async fn login(&self, name: &str) -> std::result::Result<Identity, LoginError>;
}

/// Remote search: `GET /search`.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Runs `query`, returning the raw JSON body.
    ///
    /// The body shape is not trusted; callers normalize it with
    /// [`normalize_rows`](crate::results::normalize_rows).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that is not JSON.
    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value>;
}

/// Logs in `name`, stores the identity, and returns the search location to
/// navigate to (`/search?current_id=<id>`).
///
/// On any failure nothing is stored and no navigation should happen. A
/// failure to persist the identity is logged but does not fail the login; the
/// identity is still current for this process.
///
/// # Errors
///
/// Returns the [`LoginError`] to show to the user.
pub async fn login(
    auth: &dyn AuthService,
    holder: &IdentityHolder,
    name: &str,
) -> std::result::Result<Location, LoginError> {
    // Blank input never reaches the service; anything else is sent as typed.
    if name.trim().is_empty() {
        return Err(LoginError::MissingName);
    }

    let identity = auth.login(name).await?;
    if identity.id.is_blank() {
        return Err(LoginError::InvalidResponse {
            message: "identity has a blank id".to_string(),
        });
    }

    let location = Location::search(seed(&QueryParams::new(), &identity));
    info!(user = %identity.name, current_id = %identity.id, "logged in");

    if let Err(e) = holder.set(Some(identity)) {
        warn!(error = %e, "failed to persist identity");
    }

    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FixedAuth {
        outcome: fn() -> std::result::Result<Identity, LoginError>,
        calls: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuthService for FixedAuth {
        async fn login(&self, name: &str) -> std::result::Result<Identity, LoginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.names.lock().expect("names lock").push(name.to_string());
            (self.outcome)()
        }
    }

    fn auth(outcome: fn() -> std::result::Result<Identity, LoginError>) -> FixedAuth {
        FixedAuth {
            outcome,
            calls: AtomicUsize::new(0),
            names: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn success_stores_identity_and_targets_search() {
        let service = auth(|| Ok(Identity::new(7, "Akash", "p7")));
        let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));

        let location = login(&service, &holder, "Akash").await.expect("login");
        assert_eq!(location.to_string(), "/search?current_id=7");
        assert_eq!(holder.get().map(|i| i.current_id()).as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn name_is_sent_as_typed() {
        let service = auth(|| Ok(Identity::new(7, "Akash", "p7")));
        let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));

        login(&service, &holder, " Akash ").await.expect("login");
        assert_eq!(
            service.names.lock().expect("names lock").as_slice(),
            [" Akash "]
        );
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_a_call() {
        let service = auth(|| Ok(Identity::new(7, "Akash", "p7")));
        let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));

        let err = login(&service, &holder, "   ").await.expect_err("empty name");
        assert!(matches!(err, LoginError::MissingName));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(holder.get(), None);
    }

    #[tokio::test]
    async fn rejection_changes_nothing() {
        let service = auth(|| Err(LoginError::Rejected { status: 401 }));
        let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));

        let err = login(&service, &holder, "Nobody").await.expect_err("rejected");
        assert_eq!(err.to_string(), "Login failed (status 401)");
        assert_eq!(holder.get(), None);
    }

    #[tokio::test]
    async fn network_failure_is_distinct_and_changes_nothing() {
        let service = auth(|| {
            Err(LoginError::Network {
                message: "connection refused".to_string(),
            })
        });
        let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));
        holder
            .set(Some(Identity::new(1, "Prev", "p1")))
            .expect("seed previous identity");

        let err = login(&service, &holder, "Akash").await.expect_err("network");
        assert!(err.to_string().starts_with("Network error"));
        assert_eq!(holder.get().map(|i| i.name), Some("Prev".to_string()));
    }
}

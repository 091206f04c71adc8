//! Stub remote service for integration tests.
//!
//! Serves `POST /login` and `GET /search` on `127.0.0.1:0` with scripted
//! answers:
//! - login succeeds for registered names and answers `401` otherwise
//! - search answers are keyed by the exact query string received, can be
//!   delayed, and default to `200 []`
//! - every request is recorded as `METHOD /path?query`

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_core::Identity;
use serde::Deserialize;
use tokio::sync::oneshot;

/// A scripted answer to one search query.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    /// HTTP status.
    pub status: u16,
    /// Raw response body, sent as `application/json`.
    pub body: String,
    /// Delay before answering.
    pub delay: Duration,
}

impl ScriptedResponse {
    /// `200` with a JSON body.
    pub fn json(body: &serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Arbitrary status and raw body (which need not be JSON).
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Delays the answer by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct StubState {
    users: HashMap<String, serde_json::Value>,
    searches: HashMap<String, ScriptedResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubState {
    fn record(&self, request: String) {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);
    }
}

/// Builder for [`StubServer`].
#[derive(Default)]
pub struct StubServerBuilder {
    state: StubState,
}

impl StubServerBuilder {
    /// Registers a user that can log in by name.
    #[must_use]
    pub fn user(mut self, identity: &Identity) -> Self {
        let body = serde_json::to_value(identity).expect("identity serializes");
        self.state.users.insert(identity.name.clone(), body);
        self
    }

    /// Scripts the answer for an exact search query string
    /// (e.g. `current_id=7&min_age=25`).
    #[must_use]
    pub fn search(mut self, query: impl Into<String>, response: ScriptedResponse) -> Self {
        self.state.searches.insert(query.into(), response);
        self
    }

    /// Starts the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> std::io::Result<StubServer> {
        let state = Arc::new(self.state);
        let app = Router::new()
            .route("/login", post(login))
            .route("/search", get(search))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Ok(StubServer {
            base_url: format!("http://{addr}"),
            state,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }
}

/// Running stub server. Shuts down when dropped.
pub struct StubServer {
    base_url: String,
    state: Arc<StubState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for StubServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubServer")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StubServer {
    /// Starts building a stub server.
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    /// Server base URL (e.g., `http://127.0.0.1:12345`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Search requests received so far (`GET /search?...` entries only).
    pub fn search_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with("GET /search"))
            .collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Returns a base URL on which nothing is listening.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub async fn unreachable_base_url() -> std::io::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    name: String,
}

async fn login(
    State(state): State<Arc<StubState>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    state.record(format!("POST /login {}", request.name));

    match state.users.get(&request.name) {
        Some(identity) => (StatusCode::OK, Json(identity.clone())).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "User not found" })),
        )
            .into_response(),
    }
}

async fn search(
    State(state): State<Arc<StubState>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let query = query.unwrap_or_default();
    state.record(format!("GET /search?{query}"));

    let response = state
        .searches
        .get(&query)
        .cloned()
        .unwrap_or_else(|| ScriptedResponse::json(&serde_json::json!([])));

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_login_and_scripted_search() {
        let server = StubServer::builder()
            .user(&Identity::new(7, "Akash", "p7"))
            .search(
                "current_id=7",
                ScriptedResponse::json(&serde_json::json!([{"id": 1}])),
            )
            .start()
            .await
            .expect("start stub");

        let client = reqwest::Client::new();
        let ok = client
            .post(format!("{}/login", server.base_url()))
            .json(&serde_json::json!({"name": "Akash"}))
            .send()
            .await
            .expect("login request");
        assert_eq!(ok.status(), 200);

        let rejected = client
            .post(format!("{}/login", server.base_url()))
            .json(&serde_json::json!({"name": "Nobody"}))
            .send()
            .await
            .expect("login request");
        assert_eq!(rejected.status(), 401);

        let body: serde_json::Value = client
            .get(format!("{}/search?current_id=7", server.base_url()))
            .send()
            .await
            .expect("search request")
            .json()
            .await
            .expect("json body");
        assert_eq!(body, serde_json::json!([{"id": 1}]));

        assert_eq!(
            server.requests(),
            [
                "POST /login Akash",
                "POST /login Nobody",
                "GET /search?current_id=7"
            ]
        );
    }
}

//! Observability infrastructure for roster.
//!
//! Structured logging through `tracing`, plus span constructors so the
//! synchronizer and the login flow log with consistent fields.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs.
    Json,
    /// Compact single-line logs (for interactive use).
    #[default]
    Compact,
}

/// Initializes the logging subsystem.
///
/// Safe to call multiple times; subsequent calls are no-ops. `default_level`
/// is used when `RUST_LOG` is unset or unparseable.
///
/// # Example
///
/// ```rust
/// use roster_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Compact, "warn");
/// ```
pub fn init_logging(format: LogFormat, default_level: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .compact()
                            .with_target(false)
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
    });
}

/// Creates a span for one search fetch, tagged with the snapshot it serves.
#[must_use]
pub fn fetch_span(revision: u64, current_id: &str) -> Span {
    tracing::info_span!("fetch", revision = revision, current_id = current_id)
}

/// Creates a span for a search session.
#[must_use]
pub fn session_span(location: &str) -> Span {
    tracing::info_span!("search_session", location = location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogFormat::Compact, "warn");
        init_logging(LogFormat::Json, "debug");
    }

    #[test]
    fn fetch_span_creates_span() {
        let span = fetch_span(3, "7");
        let _guard = span.enter();
        tracing::info!("message in fetch span");
    }
}

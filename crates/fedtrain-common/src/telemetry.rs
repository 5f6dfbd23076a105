//! Tracing initialization for fedtrain binaries
//!
//! Structured logging via `tracing` with env-filter control and optional
//! JSON output for log aggregation.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Filter defaults to `info` with fedtrain crates at `debug`; override with
/// `RUST_LOG`. When `json` is set, events are emitted as JSON lines.
pub fn init(json: bool) -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fedtrain=debug,kube=info,tower=warn,hyper=warn"));

    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .try_init()
    };

    result.map_err(|e| {
        crate::Error::internal_with_context("telemetry", format!("subscriber init failed: {e}"))
    })
}

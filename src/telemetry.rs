//! Tracing subscriber initialization for host processes.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Filter directives come from `RUST_LOG`, defaulting to `info` for this
/// crate. With `json` set, events are emitted as structured JSON for log
/// aggregation. Safe to call once per process; subsequent calls are
/// ignored.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coach_compass=info"));

    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

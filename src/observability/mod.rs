//! Observability: structured tracing and the typed outcome event stream.

pub mod events;

pub use events::{Event, EventLog};

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Filter from `RUST_LOG`, defaulting to `info`. Safe to call more than
/// once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

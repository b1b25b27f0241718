//! Tracing initialization.
//!
//! Console logging only: an [`EnvFilter`] driven by `RUST_LOG` (with a
//! service-level default) feeding a compact fmt layer. There is no trace
//! export pipeline; the handlers log state transitions and failures directly.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// Honors `RUST_LOG` when set, otherwise defaults to debug-level output for
/// this service and the HTTP trace layer, info for everything else.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wardrobed=debug,tower_http=debug,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

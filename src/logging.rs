//! Tracing subscriber setup for binaries embedding this crate.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the JSON subscriber with env-filter control.
///
/// Call once at startup; `RUST_LOG` overrides the default filter.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

//! Opt-in tracing setup for binaries and integration harnesses embedding
//! the engine. Library code only emits events; subscribers are the host's
//! choice.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes an env-filtered fmt subscriber. `default_directive` is used
/// when `RUST_LOG` is unset (e.g. `"engine=info"`).
pub fn init(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub mod tracing;

pub use self::tracing::trade_span;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Filter via `RUST_LOG`, default `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

//! Subscriber setup for the binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Pick the log filter
///
/// `-v` and `-vv` win; otherwise `RUST_LOG`, then the configured filter.
#[must_use]
pub fn filter_for(verbose: u8, configured: &str) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    }
}

/// Install the global subscriber, writing to stderr
///
/// A second call is a no-op.
pub fn init(verbose: u8, configured: &str) {
    let filter = filter_for(verbose, configured);
    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

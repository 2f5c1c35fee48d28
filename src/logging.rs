// Logging
// tracing-subscriber setup; RUST_LOG overrides the configured filter

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber. Returns an error if one is already set.
pub fn try_init_logging(default_filter: &str) -> Result<(), String> {
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(stderr)
        .with_target(true)
        .with_level(true)
        .compact()
        .try_init()
        .map_err(|e| e.to_string())
}

/// Install the global subscriber, ignoring a previously installed one
pub fn init_logging(default_filter: &str) {
    if let Err(e) = try_init_logging(default_filter) {
        tracing::debug!(error = %e, "logging already initialized");
    }
}

use tracing_subscriber::EnvFilter;

/// Variable read for the log filter before falling back to `RUST_LOG`.
pub const LOG_VAR: &str = "RELEASE_NOTIFIER_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Logs go to stderr; stdout carries only the
/// run's result.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(std::env::var_os("DISABLE_COLOR").is_none())
        .init();
}

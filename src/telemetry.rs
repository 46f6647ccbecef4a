use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "web_summarizer=info,tower_http=info";

/// Installs the global fmt subscriber, filtered by `RUST_LOG` when set.
/// Logs go to stderr so the CLI's stdout only carries its result.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "ARBIFY_LOG";

/// Install the stderr subscriber.
///
/// `ARBIFY_LOG` wins when set; otherwise warnings only, or debug with `-v`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "arbify=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A second install (tests, library callers) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

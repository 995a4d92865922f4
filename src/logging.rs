use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` and the
/// default is `warn`, leaving normal output to the `ui` module.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("git_release={}", default_level)));

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr.
///
/// The default level is `info`, or `debug` when the settings file enables
/// debug logging. `RUST_LOG` overrides either.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

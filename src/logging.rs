use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Compact logs on stderr, stdout is reserved for the report itself.
pub fn init(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let default = if verbose { "reports=debug" } else { "reports=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
}

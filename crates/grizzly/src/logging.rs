//! Tracing subscriber setup for hosts embedding grizzly.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a global subscriber and routes `log` records into it.
///
/// `RUST_LOG` overrides `default_filter`. Fails if a logger or subscriber is
/// already installed.
pub fn init(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr));

    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

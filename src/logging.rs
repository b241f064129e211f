//! Logging setup for the mosaic binary.
//!
//! Logs go to stderr so command output on stdout stays clean.
//! The level can be controlled via the `RUST_LOG` environment variable.
//!
//! Default log levels:
//! - `mosaic` modules: INFO (DEBUG with `--verbose`)
//! - Other crates: WARN

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "mosaic=debug,warn"
    } else {
        "mosaic=info,warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!("logging initialized");
    Ok(())
}

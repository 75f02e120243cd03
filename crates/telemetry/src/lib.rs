//! Logging bootstrap.

use anyhow::Context;
use booknest_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&settings.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };
    installed.context("failed to install tracing subscriber")?;

    tracing::debug!(
        target: "booknest-telemetry",
        level = %settings.log_level,
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

/// Parse a verbosity level such as `info` or `booknest=debug,tower_http=warn`.
pub fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(level.to_lowercase())
        .with_context(|| format!("invalid log level '{}'", level))
}

//! Log subscriber setup for the CLI.
//!
//! Events go to stderr so command output on stdout stays clean. The filter is
//! taken from `--log-level`, then `RUST_LOG`, then the `logging.level`
//! preference.

use anyhow::{Context, Result};
use outlinewriter_settings::{LogFormat, LoggingPreferences};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub fn init_logging(cli_level: Option<&str>, preferences: &LoggingPreferences) -> Result<()> {
    let filter = build_env_filter(cli_level, preferences)?;
    let base_subscriber = Registry::default().with(filter);
    match preferences.format {
        LogFormat::Json => base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("failed to install log subscriber")
}

fn build_env_filter(cli_level: Option<&str>, preferences: &LoggingPreferences) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return EnvFilter::try_new(level)
            .with_context(|| format!("invalid --log-level '{level}'"));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&preferences.level)
        .with_context(|| format!("invalid logging.level '{}'", preferences.level))
}

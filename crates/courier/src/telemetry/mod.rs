//! Tracing subscriber bootstrap for processes embedding courier.
//!
//! The subscriber is process-global, so the first call to [`initialise`]
//! decides the settings. Concurrent publishing runs notification handlers on
//! scoped threads, so records carry thread ids in that mode.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use courier_config::{Config, LogFormat, PublishMode};

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Settings of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    thread_ids: bool,
}

impl TelemetryHandle {
    fn for_config(config: &Config) -> Self {
        Self {
            format: config.log_format(),
            thread_ids: matches!(config.publish_mode(), PublishMode::Concurrent),
        }
    }

    /// Returns the record format in use.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }

    /// Returns `true` when records include the emitting thread id.
    #[must_use]
    pub const fn thread_ids(self) -> bool {
        self.thread_ids
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was installed outside courier.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global tracing subscriber described by `config`.
///
/// Only the first successful call installs anything. Later calls return the
/// handle of the subscriber already in place, whatever `config` says.
///
/// # Errors
///
/// Fails when the log filter does not parse or another subscriber was
/// installed outside this function.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED.get_or_try_init(|| install_subscriber(config)).copied()
}

/// Parses the filter expression from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the expression is invalid.
pub fn filter(config: &Config) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install_subscriber(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let env_filter = filter(config)?;
    let handle = TelemetryHandle::for_config(config);
    let colour = !handle.format.is_structured() && io::stderr().is_terminal();

    let builder = |directives: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(directives)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(handle.thread_ids)
            .with_writer(io::stderr)
            .with_ansi(colour)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match handle.format {
        LogFormat::Json => Box::new(builder(env_filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(env_filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(handle)
}

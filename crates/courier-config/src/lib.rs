//! Shared configuration for the courier dispatcher.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! TOML file passed with `--config-path`, then `COURIER_*` environment
//! variables, then command-line flags. Load it through the re-exported
//! [`OrthoConfig`] trait: `Config::load()` reads the process arguments and
//! `Config::load_from_iter(args)` takes an explicit argument list.

mod defaults;
mod logging;
mod publish;

use serde::{Deserialize, Serialize};

pub use ortho_config::OrthoConfig;

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
    default_publish_mode,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use publish::{PublishMode, PublishModeParseError};

/// Runtime configuration consumed by the dispatcher and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "COURIER")]
pub struct Config {
    /// Filter expression handed to the tracing subscriber.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for emitted log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Fan-out strategy applied by `publish`.
    #[ortho_config(default = default_publish_mode())]
    pub publish_mode: PublishMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            publish_mode: default_publish_mode(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the configured notification fan-out strategy.
    #[must_use]
    pub const fn publish_mode(&self) -> PublishMode {
        self.publish_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_builtin_values() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.publish_mode(), PublishMode::Concurrent);
    }

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        let parsed: LogFormat = input.parse().expect("format should parse");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case(LogFormat::Json, true)]
    #[case(LogFormat::Compact, false)]
    fn only_json_is_structured(#[case] format: LogFormat, #[case] expected: bool) {
        assert_eq!(format.is_structured(), expected);
    }

    #[rstest]
    #[case("concurrent", PublishMode::Concurrent)]
    #[case("Sequential", PublishMode::Sequential)]
    fn publish_mode_parses_case_insensitively(
        #[case] input: &str,
        #[case] expected: PublishMode,
    ) {
        let parsed: PublishMode = input.parse().expect("mode should parse");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn unknown_publish_mode_is_rejected() {
        assert!("broadcast".parse::<PublishMode>().is_err());
    }

    #[rstest]
    fn publish_mode_displays_in_snake_case() {
        assert_eq!(PublishMode::Sequential.to_string(), "sequential");
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the records courier writes to stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record with span and event fields flattened.
    #[default]
    Json,
    /// One short human-readable line per record.
    Compact,
}

impl LogFormat {
    /// Returns `true` when records are meant for machines rather than a
    /// terminal. Structured records never carry colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when `--log-format` or `COURIER_LOG_FORMAT` names an
/// unknown format.
pub type LogFormatParseError = strum::ParseError;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Strategy used when a notification is delivered to several handlers.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PublishMode {
    /// Every handler runs on its own scoped thread and the dispatcher joins
    /// them all before reporting.
    #[default]
    Concurrent,
    /// Handlers run one after another on the publishing thread. Every
    /// handler still runs even when an earlier one fails.
    Sequential,
}

/// Errors encountered while parsing a [`PublishMode`] from text.
pub type PublishModeParseError = strum::ParseError;

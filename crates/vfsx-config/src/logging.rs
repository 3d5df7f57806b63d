//! Log output format selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported daemon log formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line human-readable output for interactive runs.
    Compact,
}

impl LogFormat {
    /// Whether ANSI colour codes may be written in this format. JSON events
    /// are consumed by machines, so they stay plain even on a terminal.
    #[must_use]
    pub const fn allows_colour(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

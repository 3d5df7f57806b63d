//! Bridge behaviour switches: which handler serves sessions and which status
//! the shim sees.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stock handler constructed for each new session.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HandlerKind {
    /// Every recognised operation proceeds unchanged.
    #[default]
    Transparent,
    /// Logs every operation, then lets it proceed.
    Audit,
    /// Refuses mutating operations with an authorisation failure.
    ReadOnly,
}

/// Status written back to the shim after dispatch.
///
/// `Report` sends the status computed by the handler. `Transparent` answers
/// `0` whatever the handler decided, for shims that treat the bridge as an
/// observer only.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusPolicy {
    /// Write the status computed by the dispatcher.
    #[default]
    Report,
    /// Always write transparent success.
    Transparent,
}

/// Errors encountered while parsing a policy value from text.
pub type PolicyParseError = strum::ParseError;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format of the `quill` log stream on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log collectors.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

impl LogFormat {
    /// Whether the format may carry ANSI colour codes when stderr is a
    /// terminal.
    #[must_use]
    pub const fn supports_ansi(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

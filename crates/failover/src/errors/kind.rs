use std::fmt;

use serde::Serialize;

/// Classification of a per-source failure.
///
/// # Behavior Summary
///
/// | Kind | Next candidate? | Recorded against source health? |
/// |------|-----------------|---------------------------------|
/// | `Timeout` | Yes | Yes |
/// | `Protocol` | Yes | Yes |
/// | `Network` | Yes | Yes |
/// | `Unavailable` | Yes | Yes |
/// | `Cancelled` | No, the loop stops | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceErrorKind {
    Timeout,
    Protocol,
    Network,
    Unavailable,
    Cancelled,
}

impl SourceErrorKind {
    /// Whether an error of this kind is the source's fault and should be
    /// fed into its performance window.
    pub fn counts_against_health(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "SOURCE_TIMEOUT",
            Self::Protocol => "PROTOCOL_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Unavailable => "SOURCE_UNAVAILABLE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

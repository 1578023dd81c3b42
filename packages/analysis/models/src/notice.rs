//! Non-fatal conditions surfaced alongside degraded output.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Category of a recovered condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeKind {
    /// A source file was absent; demo data or an "unavailable" marker was used.
    MissingFile,
    /// A required row was absent or non-numeric; the scenario was dropped.
    MalformedRow,
    /// Records with null or empty keys were skipped.
    InvalidIdentifier,
    /// An embedded list field was outside the literal grammar.
    UnsafeLiteral,
    /// Boundaries could not be read; the map fell back to markers only.
    GeometryUnavailable,
    /// A nearby activation rate stood in for the requested one.
    SubstitutedRate,
    /// A scenario activated a different share of schools than its rate
    /// column says; it is kept under the column rate.
    RateMismatch,
}

/// A visible, non-blocking message attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// What kind of degradation happened.
    pub kind: NoticeKind,
    /// Human-readable explanation.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

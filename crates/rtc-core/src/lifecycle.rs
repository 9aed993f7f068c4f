//! Work-item lifecycle: coarse states and the workflow actions between them.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Coarse lifecycle state derived from the server's `internalState` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl LifecycleState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Map a server state label. Unknown labels yield `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "new" | "open" | "reopened" => Some(Self::Open),
            "in progress" | "started" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" | "verified" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Whether `action` may be applied from this state.
    ///
    /// Valid transitions:
    /// - `open -> in progress` (start)
    /// - `open -> resolved`, `in progress -> resolved` (resolve)
    /// - `resolved -> closed` (close)
    /// - `resolved -> open`, `closed -> open` (reopen)
    #[must_use]
    pub const fn allows(self, action: LifecycleAction) -> bool {
        matches!(
            (self, action),
            (Self::Open, LifecycleAction::Start)
                | (Self::Open | Self::InProgress, LifecycleAction::Resolve)
                | (Self::Resolved, LifecycleAction::Close)
                | (Self::Resolved | Self::Closed, LifecycleAction::Reopen)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow action the client can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Resolve,
    Close,
    Reopen,
}

impl LifecycleAction {
    /// Verb used in messages, e.g. "failed to resolve work item 7".
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Resolve => "resolve",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    /// Suffix appended to the workflow action prefix on the wire.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Start => "startWorking",
            Self::Resolve => "resolve",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    /// `internalState` label the server reports once the action applied.
    #[must_use]
    pub const fn expected_label(self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Resolve => "Resolved",
            Self::Close => "Closed",
            Self::Reopen => "Reopened",
        }
    }

    #[must_use]
    pub const fn target(self) -> LifecycleState {
        match self {
            Self::Start => LifecycleState::InProgress,
            Self::Resolve => LifecycleState::Resolved,
            Self::Close => LifecycleState::Closed,
            Self::Reopen => LifecycleState::Open,
        }
    }

    /// Full wire action, e.g. `bugzillaWorkflow.action.resolve`.
    #[must_use]
    pub fn wire_action(self, prefix: &str) -> String {
        format!("{prefix}.{}", self.code())
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an action name from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid action: '{}'", self.0)
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for LifecycleAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "startworking" => Ok(Self::Start),
            "resolve" => Ok(Self::Resolve),
            "close" => Ok(Self::Close),
            "reopen" => Ok(Self::Reopen),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

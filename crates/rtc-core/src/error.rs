use std::fmt;

/// Machine-readable error codes for scripting against `rtc` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissing,
    ConfigParseError,
    TransportFailed,
    HttpStatus,
    AuthFailed,
    DecodeFailed,
    ItemNotFound,
    ValidationFailed,
    InvalidStateTransition,
    ActionNotApplied,
    PartialFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::TransportFailed => "E2001",
            Self::HttpStatus => "E2002",
            Self::AuthFailed => "E2003",
            Self::DecodeFailed => "E3001",
            Self::ItemNotFound => "E4001",
            Self::ValidationFailed => "E4002",
            Self::InvalidStateTransition => "E4003",
            Self::ActionNotApplied => "E5001",
            Self::PartialFailure => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigMissing => "Configuration not found",
            Self::ConfigParseError => "Config file parse error",
            Self::TransportFailed => "Network request failed",
            Self::HttpStatus => "Server returned an error status",
            Self::AuthFailed => "Authentication rejected",
            Self::DecodeFailed => "Unexpected response format",
            Self::ItemNotFound => "Work item not found",
            Self::ValidationFailed => "Invalid input",
            Self::InvalidStateTransition => "Invalid state transition",
            Self::ActionNotApplied => "Workflow action not applied",
            Self::PartialFailure => "Multi-step operation stopped partway",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigMissing => Some("Run `rtc config init --user <name>` to create one."),
            Self::ConfigParseError => Some("Fix syntax in the rtc config.toml and retry."),
            Self::TransportFailed => Some("Check network access to the Jazz server and retry."),
            Self::HttpStatus => None,
            Self::AuthFailed => Some("Verify username and password (or RTC_PASSWORD)."),
            Self::DecodeFailed => Some("Re-run with --verbose and report the response snippet."),
            Self::ItemNotFound => Some("Check the id with `rtc find <text>`."),
            Self::ValidationFailed => None,
            Self::InvalidStateTransition => {
                Some("Follow valid transitions: open -> in progress -> resolved -> closed.")
            }
            Self::ActionNotApplied => Some("Inspect the item with `rtc show <id>` and retry."),
            Self::PartialFailure => {
                Some("Earlier steps were committed on the server; inspect before retrying.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every failure the client core can report.
#[derive(Debug, thiserror::Error)]
pub enum RtcError {
    /// Connection-level failure; nothing was exchanged with the server.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a status of 400 or above.
    #[error("got HTTP status code {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The login check redirected to the failure page.
    #[error("failed to authenticate user {user}")]
    Auth { user: String },

    /// The payload could not be normalized or decoded.
    #[error("failed to decode {context}: near `{snippet}`")]
    Decode { context: String, snippet: String },

    #[error("no {what} with id {id} found")]
    NotFound { what: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("cannot {action} work item {id}: it is {from}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        from: String,
    },

    /// Post-write verification found the item in a different state.
    #[error("failed to {action} work item {id}: expected state {expected}, current state is {actual}")]
    ActionFailed {
        action: String,
        id: String,
        expected: String,
        actual: String,
    },

    /// A multi-step flow stopped; `committed` lists side effects that persist.
    #[error("{operation} failed at step '{step}'{}: {source}", committed_suffix(.committed.as_deref()))]
    StepFailed {
        operation: &'static str,
        step: &'static str,
        committed: Option<String>,
        #[source]
        source: Box<RtcError>,
    },

    #[error("config error: {message}")]
    Config {
        message: String,
        missing: bool,
    },
}

fn committed_suffix(committed: Option<&str>) -> String {
    committed.map_or_else(String::new, |c| format!(" (already committed: {c})"))
}

impl RtcError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::TransportFailed,
            Self::HttpStatus { .. } => ErrorCode::HttpStatus,
            Self::Auth { .. } => ErrorCode::AuthFailed,
            Self::Decode { .. } => ErrorCode::DecodeFailed,
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::ActionFailed { .. } => ErrorCode::ActionNotApplied,
            Self::StepFailed { .. } => ErrorCode::PartialFailure,
            Self::Config { missing: true, .. } => ErrorCode::ConfigMissing,
            Self::Config { missing: false, .. } => ErrorCode::ConfigParseError,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn decode(context: impl Into<String>, payload: &str) -> Self {
        Self::Decode {
            context: context.into(),
            snippet: snippet(payload),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

const SNIPPET_LEN: usize = 160;

/// Bounded prefix of a payload for diagnostics, cut on a char boundary.
fn snippet(payload: &str) -> String {
    match payload.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &payload[..idx]),
        None => payload.to_string(),
    }
}

/// Attach step context to a fallible stage of a multi-step operation.
pub(crate) trait StepContext<T> {
    fn step(
        self,
        operation: &'static str,
        step: &'static str,
        committed: Option<&str>,
    ) -> Result<T, RtcError>;
}

impl<T> StepContext<T> for Result<T, RtcError> {
    fn step(
        self,
        operation: &'static str,
        step: &'static str,
        committed: Option<&str>,
    ) -> Result<T, RtcError> {
        self.map_err(|source| RtcError::StepFailed {
            operation,
            step,
            committed: committed.map(str::to_string),
            source: Box::new(source),
        })
    }
}

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // Blue - informational
    Warning,  // Yellow - recoverable
    Error,    // Red - operation failed
    Critical, // Red + modal - requires user action
}

/// Domain-specific errors for the configuration window core
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An action was invoked while its precondition was false. Rejected
    /// before dispatch; callers surface this as a status message.
    #[error("{operation} is not available: {reason}")]
    InvalidOperation {
        operation: &'static str,
        reason: String,
    },

    /// A second script run was requested while one is in flight. The
    /// coordinator rejects overlapping starts rather than trusting the UI
    /// layer to have kept the button disabled.
    #[error("a script is already running")]
    ScriptAlreadyRunning,

    /// Recording requested while a session is already active, or while a
    /// script run holds the background slot.
    #[error("input recording cannot start: {0}")]
    RecordingUnavailable(String),

    #[error("recorder failed to arm: {0}")]
    RecorderArm(#[source] anyhow::Error),

    #[error("script '{script}' failed: {message}")]
    ScriptExecution { script: String, message: String },

    #[error("failed to read layout preferences: {0}")]
    LayoutRead(#[source] std::io::Error),

    #[error("failed to write layout preferences: {0}")]
    LayoutWrite(#[source] std::io::Error),

    #[error("layout preference file is malformed: {0}")]
    LayoutParse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidOperation { .. } => ErrorSeverity::Warning,
            Self::ScriptAlreadyRunning => ErrorSeverity::Warning,
            Self::RecordingUnavailable(_) => ErrorSeverity::Warning,
            Self::RecorderArm(_) => ErrorSeverity::Error,
            Self::ScriptExecution { .. } => ErrorSeverity::Error,
            Self::LayoutRead(_) => ErrorSeverity::Warning,
            Self::LayoutWrite(_) => ErrorSeverity::Error,
            Self::LayoutParse(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidOperation { operation, reason } => {
                format!("Cannot {}: {}", operation, reason)
            }
            Self::ScriptAlreadyRunning => {
                "A script is already running. Wait for it to finish.".to_string()
            }
            Self::RecordingUnavailable(reason) => {
                format!("Cannot start recording: {}", reason)
            }
            Self::RecorderArm(e) => format!("Recorder failed to start: {}", e),
            Self::ScriptExecution { script, message } => {
                format!("Script '{}' failed: {}", script, message)
            }
            Self::LayoutRead(_) | Self::LayoutParse(_) => {
                "Window layout preferences could not be loaded; using defaults.".to_string()
            }
            Self::LayoutWrite(_) => "Window layout preferences could not be saved.".to_string(),
        }
    }

    pub(crate) fn invalid_operation(
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOperation {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Extension trait for logging recoverable failures instead of propagating
/// them. `#[track_caller]` records where the failure actually happened, not
/// this module.
pub trait ResultExt<T> {
    /// Log at error level and return None. For failures worth investigating.
    fn log_err(self) -> Option<T>;
    /// Log at warn level and return None. For failures that are expected in
    /// some states (e.g. posting an event while the window tears down).
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

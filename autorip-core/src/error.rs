// ============================================================================
// autorip-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the autorip-core Library
//
// One error enum covers the whole library. Callers distinguish ledger
// failures (which must abort the invocation) from everything else (which is
// recorded against a title or logged) with `CoreError::is_ledger_failure`.
//
// AI-ASSISTANT-INFO: Error types and helper constructors for autorip-core

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

// ---- Internal crate imports ----
use crate::status::TitleStatus;

/// Custom error type for the autorip-core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("A title is already recorded for path '{}'", .0.display())]
    DuplicatePath(PathBuf),

    #[error("Title {0} was not found in the ledger")]
    TitleNotFound(i64),

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: TitleStatus, to: TitleStatus },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Required command '{0}' not found")]
    DependencyNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Command '{command}' exited with {status}: {detail}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        detail: String,
    },

    #[error("{tool}: {message}")]
    Collaborator { tool: String, message: String },

    #[error("Stage lock error: {0}")]
    Lock(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl CoreError {
    /// Returns true when the error comes from the ledger store itself.
    ///
    /// Status writes are correctness-critical, so the orchestrator propagates
    /// these instead of treating them as a per-title outcome.
    pub fn is_ledger_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Ledger(_) | CoreError::TitleNotFound(_) | CoreError::IllegalTransition { .. }
        )
    }
}

/// Result type alias used throughout autorip-core.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// HELPER CONSTRUCTORS
// ============================================================================

pub(crate) fn command_start_error(command: &str, err: io::Error) -> CoreError {
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(command.to_string())
    } else {
        CoreError::CommandStart(command.to_string(), err)
    }
}

pub(crate) fn command_failed_error(
    command: &str,
    status: ExitStatus,
    detail: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.to_string(),
        status,
        detail: detail.into(),
    }
}

pub(crate) fn collaborator_error(tool: &str, message: impl Into<String>) -> CoreError {
    CoreError::Collaborator {
        tool: tool.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_failures_are_flagged() {
        let err = CoreError::TitleNotFound(7);
        assert!(err.is_ledger_failure());

        let err = CoreError::IllegalTransition {
            from: TitleStatus::Finalized,
            to: TitleStatus::Ripping,
        };
        assert!(err.is_ledger_failure());

        let err = collaborator_error("makemkvcon", "drive not ready");
        assert!(!err.is_ledger_failure());
        assert_eq!(err.to_string(), "makemkvcon: drive not ready");
    }

    #[test]
    fn test_missing_binary_maps_to_dependency_not_found() {
        let err = command_start_error("HandBrakeCLI", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CoreError::DependencyNotFound(ref name) if name == "HandBrakeCLI"));

        let err = command_start_error("HandBrakeCLI", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, CoreError::CommandStart(..)));
    }
}

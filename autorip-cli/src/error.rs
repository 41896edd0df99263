// ============================================================================
// autorip-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses autorip-core's error type and adds context to it where a
// failure needs to say which file or step it came from. Fatal errors are
// printed once, in red, by `report_fatal`.
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- External crate imports ----
use owo_colors::OwoColorize;

// ---- Internal crate imports ----
use autorip_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;
use std::io::IsTerminal;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Extension trait for adding context to errors in the CLI.
pub trait CliErrorContext<T> {
    /// Add context to an error.
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

impl<T> CliErrorContext<T> for Option<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.ok_or_else(|| CoreError::OperationFailed(context.to_string()))
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| CoreError::OperationFailed(f().to_string()))
    }
}

// Configuration errors keep their variant so callers can still tell them
// apart from runtime failures.
fn wrap(error: CoreError, context: impl fmt::Display) -> CoreError {
    match error {
        CoreError::Config(message) => CoreError::Config(format!("{}: {}", context, message)),
        CoreError::ConfigParse(e) => CoreError::Config(format!("{}: {}", context, e)),
        other if other.is_ledger_failure() => other,
        other => CoreError::OperationFailed(format!("{}: {}", context, other)),
    }
}

/// Prints a fatal error to stderr.
pub fn report_fatal(error: &CoreError) {
    let label = if error.is_ledger_failure() {
        "Ledger failure:"
    } else {
        "Error:"
    };
    if std::io::stderr().is_terminal() {
        eprintln!("{} {}", label.red().bold(), error);
    } else {
        eprintln!("{} {}", label, error);
    }
}

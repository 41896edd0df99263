// ============================================================================
// autorip-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and File Dispatch
//
// The core library logs through the `log` facade. This module installs a
// `fern` dispatcher with up to two chains:
//
// - console: stderr, level tag colored when stderr is a terminal; omitted
//   with `--silent`
// - file: `logging.file` from the settings, one timestamped line per record
//
// AI-ASSISTANT-INFO: fern logger initialization for the autorip binary

// ---- External crate imports ----
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};
use autorip_core::CoreError;

// ---- Standard library imports ----
use std::io::IsTerminal;
use std::path::Path;

/// Dependency targets that are only useful when they go wrong.
const QUIET_TARGETS: [&str; 4] = ["ntfy", "ureq", "rustls", "rusqlite"];

/// Installs the global logger.
pub fn init_logging(level: LevelFilter, silent: bool, file: Option<&Path>) -> CliResult<()> {
    let mut root = fern::Dispatch::new().level(level);
    for target in QUIET_TARGETS {
        root = root.level_for(target, LevelFilter::Warn);
    }

    if !silent {
        let color = std::io::stderr().is_terminal();
        root = root.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    out.finish(format_args!(
                        "{} {}",
                        level_tag(record.level(), color),
                        message
                    ))
                })
                .chain(std::io::stderr()),
        );
    }

    if let Some(path) = file {
        let log_file = fern::log_file(path)
            .cli_with_context(|| format!("Cannot open log file {}", path.display()))?;
        root = root.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}",
                        file_line(
                            &get_timestamp(),
                            record.level(),
                            record.target(),
                            &message.to_string()
                        )
                    ))
                })
                .chain(log_file),
        );
    }

    root.apply()
        .map_err(|e| CoreError::OperationFailed(format!("Cannot install logger: {}", e)))
}

/// Local time as "YYYY-MM-DD HH:MM:SS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn file_line(timestamp: &str, level: Level, target: &str, message: &str) -> String {
    format!("{} [{}] {}: {}", timestamp, level, target, message)
}

fn level_tag(level: Level, color: bool) -> String {
    let tag = format!("[{:<5}]", level);
    if !color {
        return tag;
    }
    match level {
        Level::Error => tag.red().bold().to_string(),
        Level::Warn => tag.yellow().to_string(),
        Level::Info => tag.cyan().to_string(),
        Level::Debug => tag.magenta().to_string(),
        Level::Trace => tag.blue().to_string(),
    }
}

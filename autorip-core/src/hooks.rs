//! Post-processing commands launched after a title is finalized.
//!
//! Commands are fire-and-forget: they are not awaited, retried or checked,
//! and a command that fails to start is only logged.

use crate::ledger::Title;
use crate::util::command::spawn_detached;

/// Launches up to `max_commands` of `commands` for `title`.
///
/// Each command runs through the shell with `AUTORIP_TITLE`, `AUTORIP_PATH`
/// and `AUTORIP_FILE` set. Returns how many were started.
pub fn dispatch_post_commands(commands: &[String], max_commands: usize, title: &Title) -> usize {
    if commands.len() > max_commands {
        log::warn!(
            "{} post-processing commands configured, only the first {} will run",
            commands.len(),
            max_commands
        );
    }

    let envs = [
        ("AUTORIP_TITLE", title.name.clone()),
        ("AUTORIP_PATH", title.source_path.to_string_lossy().into_owned()),
        (
            "AUTORIP_FILE",
            title
                .output_path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    ];

    let mut started = 0;
    for command in commands.iter().take(max_commands) {
        match spawn_detached(command, &envs) {
            Ok(pid) => {
                log::debug!("Started post-processing command (pid {}): {}", pid, command);
                started += 1;
            }
            Err(e) => log::warn!("Failed to start post-processing command '{}': {}", command, e),
        }
    }
    started
}

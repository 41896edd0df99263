// ============================================================================
// autorip-core/src/util/command.rs
// ============================================================================
//
// COMMAND EXECUTION: Running the External Tools
//
// Every collaborator (makemkvcon, HandBrakeCLI, ffmpeg, filebot, eject) is a
// separate program. These helpers start them, log the command line, stream
// or capture their output, and turn start failures and non-zero exits into
// CoreError values carrying the tail of stderr as detail.
//
// AI-ASSISTANT-INFO: Process spawning helpers shared by the collaborators

// ---- Standard library imports ----
use std::io::{BufRead, BufReader};
use std::process::{Command, ExitStatus, Output, Stdio};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

/// Number of stderr lines kept for error messages.
const STDERR_TAIL: usize = 5;

/// Logs the command line at debug level.
pub fn log_command(cmd: &Command) {
    log::debug!("Executing command: {}", describe(cmd));
}

/// Program name and arguments as one line.
pub fn describe(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|arg| arg.to_string_lossy()).collect();
    if args.is_empty() {
        program.into_owned()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Runs a command to completion and returns its output whatever the exit status.
pub fn capture_command(cmd: &mut Command) -> CoreResult<Output> {
    log_command(cmd);
    cmd.stdin(Stdio::null())
        .output()
        .map_err(|e| command_start_error(&program_name(cmd), e))
}

/// Runs a command to completion and fails on a non-zero exit.
pub fn run_command(cmd: &mut Command) -> CoreResult<Output> {
    let output = capture_command(cmd)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(exit_error(cmd, output.status, stderr.lines()));
    }
    Ok(output)
}

/// Runs a command, handing each stdout line to `on_line` as it arrives.
///
/// Stderr is drained on a helper thread so a chatty tool cannot block on a
/// full pipe. A non-zero exit fails with the last stderr lines as detail.
pub fn run_streaming(cmd: &mut Command, on_line: &mut dyn FnMut(&str)) -> CoreResult<()> {
    log_command(cmd);
    let program = program_name(cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(&program, e))?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CoreError::OperationFailed(format!("no stderr pipe for {}", program)))?;
    let stderr_handle = std::thread::spawn(move || {
        let mut lines = Vec::new();
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            log::trace!("STDERR: {}", line);
            lines.push(line);
        }
        lines
    });

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            on_line(&line);
        }
    }

    let status = child.wait()?;
    let stderr_lines = stderr_handle.join().unwrap_or_default();
    if !status.success() {
        return Err(exit_error(cmd, status, stderr_lines.iter().map(String::as_str)));
    }
    Ok(())
}

/// Builds a command for `program`, lowered in priority on Unix.
pub fn niced(program: &str, niceness: i32) -> Command {
    if cfg!(unix) {
        let mut cmd = Command::new("nice");
        cmd.arg("-n").arg(niceness.to_string()).arg(program);
        cmd
    } else {
        Command::new(program)
    }
}

/// Launches a shell command without waiting for it. Returns the child PID.
///
/// Output is discarded; the child is never reaped by this process.
pub fn spawn_detached(shell_command: &str, envs: &[(&str, String)]) -> CoreResult<u32> {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(shell_command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(shell_command);
        cmd
    };
    for (key, value) in envs {
        cmd.env(key, value);
    }
    log_command(&cmd);

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| command_start_error(shell_command, e))?;
    Ok(child.id())
}

fn exit_error<'a>(
    cmd: &Command,
    status: ExitStatus,
    stderr: impl Iterator<Item = &'a str>,
) -> CoreError {
    let lines: Vec<&str> = stderr.filter(|l| !l.trim().is_empty()).collect();
    let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join(" | ");
    let detail = if tail.is_empty() {
        "no error output".to_string()
    } else {
        tail
    };
    log::debug!("Command failed ({}): {}", status, detail);
    command_failed_error(&program_name(cmd), status, detail)
}

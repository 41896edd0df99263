//! `filebot` wrapper for renaming titles and fetching subtitles.

use std::path::Path;
use std::process::Command;

use crate::error::{CoreError, CoreResult, collaborator_error};
use crate::external::Renamer;
use crate::ledger::Title;
use crate::util::command::capture_command;

const NAME_FORMAT: &str = "{n} ({y})";
const NO_SUBTITLES: &str = "No matching subtitles";

#[derive(Debug, Clone)]
pub struct FileBot {
    binary: String,
}

impl FileBot {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn artifact(&self, title: &Title) -> CoreResult<std::path::PathBuf> {
        title.output_path().ok_or_else(|| {
            collaborator_error(&self.binary, format!("title '{}' has no output file", title.name))
        })
    }

    fn run(&self, cmd: &mut Command) -> CoreResult<(bool, String)> {
        let output = capture_command(cmd)?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("{}: {}", self.binary, line);
        }
        Ok((output.status.success(), text))
    }
}

impl Renamer for FileBot {
    fn rename(&self, title: &Title) -> CoreResult<String> {
        let file = self.artifact(title)?;
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-rename")
            .arg(&file)
            .args(["--db", "TheMovieDB", "--q"])
            .arg(&title.name)
            .args(["--format", NAME_FORMAT, "--action", "move", "-non-strict"]);

        let (success, text) = self.run(&mut cmd)?;
        match parse_renamed(&text) {
            Some(new_name) => Ok(new_name),
            None => Err(collaborator_error(
                &self.binary,
                last_line(&text).unwrap_or(if success {
                    "no match found"
                } else {
                    "rename failed"
                }),
            )),
        }
    }

    fn fetch_subtitles(&self, title: &Title, language: &str) -> CoreResult<bool> {
        let file = self.artifact(title)?;
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-get-subtitles")
            .arg(&file)
            .args(["--lang", language, "--output", "srt", "--encoding", "utf8", "-non-strict"]);

        let (success, text) = self.run(&mut cmd)?;
        if text.contains(NO_SUBTITLES) {
            return Ok(false);
        }
        if !success {
            return Err(CoreError::Collaborator {
                tool: self.binary.clone(),
                message: last_line(&text).unwrap_or("subtitle lookup failed").to_string(),
            });
        }
        Ok(text.lines().any(|l| l.trim_start().starts_with("Writing [")))
    }
}

/// Extracts the new file name from a `[MOVE] from [a] to [b]` result line.
pub(crate) fn parse_renamed(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("[MOVE]") || l.starts_with("[RENAME]"))
        .filter_map(|l| {
            let target = l.rsplit_once(" to [")?.1.strip_suffix(']')?;
            Path::new(target)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .last()
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

// ============================================================================
// autorip-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Collaborators the Stage Drivers Delegate To
//
// The drivers never read discs, transcode or look up metadata themselves.
// They call the traits defined here, which the concrete wrappers implement by
// spawning the real tools (makemkvcon, HandBrakeCLI or ffmpeg, filebot,
// eject). Tests substitute scripted implementations.
//
// KEY COMPONENTS:
// - DiscRipper, Transcoder, Renamer, Ejector traits
// - Disc and Track descriptions produced by the ripper
// - Dependency checking used by the self-test
//
// AI-ASSISTANT-INFO: Collaborator traits and dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::ledger::Title;

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

pub mod eject;
pub mod filebot;
pub mod makemkv;
pub mod transcoder;

pub use eject::SystemEjector;
pub use filebot::FileBot;
pub use makemkv::MakeMkv;
pub use transcoder::{Ffmpeg, HandBrake, transcoder_for};

// ============================================================================
// DISC DESCRIPTIONS
// ============================================================================

/// An inserted disc as reported by the ripper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disc {
    /// Drive index used to address the disc.
    pub index: u32,
    /// Raw volume label.
    pub label: String,
    /// Device path or drive letter, used for ejecting.
    pub location: String,
}

/// One title (track) on a disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub index: u32,
    pub duration_secs: u64,
    /// File name the ripper will write for this track.
    pub file_name: String,
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Reads inserted optical media.
pub trait DiscRipper {
    /// Lists discs currently inserted in any drive.
    fn enumerate_discs(&self) -> CoreResult<Vec<Disc>>;

    /// Human-readable title for a disc, used as its directory name.
    fn canonical_title(&self, disc: &Disc) -> String {
        canonicalize_label(&disc.label)
    }

    /// Every track on the disc, regardless of length.
    fn track_info(&self, disc: &Disc) -> CoreResult<Vec<Track>>;

    /// Extracts `track` into the directory `dest`.
    fn extract(&self, disc: &Disc, track: &Track, dest: &Path) -> CoreResult<()>;
}

/// Re-encodes a ripped file.
pub trait Transcoder {
    fn transcode(&self, input: &Path, output: &Path, args: &[String], niceness: i32)
    -> CoreResult<()>;

    /// Removes the raw input once the compressed output is in place.
    fn cleanup(&self, input: &Path) -> CoreResult<()> {
        std::fs::remove_file(input)?;
        Ok(())
    }
}

/// Identifies a title and fetches its extras.
pub trait Renamer {
    /// Renames the title's current artifact, returning the new file name.
    fn rename(&self, title: &Title) -> CoreResult<String>;

    /// Downloads subtitles next to the artifact. `Ok(false)` means no match.
    fn fetch_subtitles(&self, title: &Title, language: &str) -> CoreResult<bool>;
}

/// Opens a drive tray.
pub trait Ejector {
    fn eject(&self, location: &str) -> CoreResult<()>;
}

// ============================================================================
// HELPERS
// ============================================================================

/// Turns a volume label such as `THE_DARK_KNIGHT` into `The Dark Knight`.
///
/// Characters that cannot appear in a directory name are dropped.
pub fn canonicalize_label(label: &str) -> String {
    let cleaned: String = label
        .replace('_', " ")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();

    let words: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect();

    let title = words.join(" ");
    let title = title.trim_matches('.').trim();
    if title.is_empty() {
        "Unknown Disc".to_string()
    } else {
        title.to_string()
    }
}

/// Checks that an external command can be started.
///
/// The command is run once with `check_arg`; any exit status counts as
/// present, since several tools exit non-zero when asked for usage.
///
/// # Returns
///
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str, check_arg: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg(check_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

// ============================================================================
// autorip-core/src/external/transcoder.rs
// ============================================================================
//
// TRANSCODERS: HandBrakeCLI and ffmpeg Wrappers
//
// Both backends run at a configurable niceness so a long encode yields to
// interactive work on the same machine. Neither tool's exit status alone is
// trusted: the output file must also exist and be non-empty afterwards.
//
// AI-ASSISTANT-INFO: Transcoder trait implementations

// ---- Standard library imports ----
use std::path::Path;

// ---- Internal crate imports ----
use crate::config::{CompressConfig, CompressMethod};
use crate::error::{CoreResult, collaborator_error};
use crate::external::Transcoder;
use crate::util::command::{niced, run_streaming};

/// Builds the transcoder selected by `config.method`.
pub fn transcoder_for(config: &CompressConfig) -> Box<dyn Transcoder> {
    match config.method {
        CompressMethod::Handbrake => Box::new(HandBrake::new(config.binary())),
        CompressMethod::Ffmpeg => Box::new(Ffmpeg::new(config.binary())),
    }
}

// ============================================================================
// HANDBRAKE
// ============================================================================

#[derive(Debug, Clone)]
pub struct HandBrake {
    binary: String,
}

impl HandBrake {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Transcoder for HandBrake {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        args: &[String],
        niceness: i32,
    ) -> CoreResult<()> {
        let mut cmd = niced(&self.binary, niceness);
        cmd.arg("--input").arg(input).arg("--output").arg(output).args(args);

        run_streaming(&mut cmd, &mut |line| log::trace!("{}: {}", self.binary, line))
            .map_err(|e| collaborator_error(&self.binary, e.to_string()))?;
        verify_output(&self.binary, output)
    }
}

// ============================================================================
// FFMPEG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Transcoder for Ffmpeg {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        args: &[String],
        niceness: i32,
    ) -> CoreResult<()> {
        let mut cmd = niced(&self.binary, niceness);
        cmd.args(["-hide_banner", "-nostdin", "-y", "-i"])
            .arg(input)
            .args(args)
            .arg(output);

        run_streaming(&mut cmd, &mut |line| log::trace!("{}: {}", self.binary, line))
            .map_err(|e| collaborator_error(&self.binary, e.to_string()))?;
        verify_output(&self.binary, output)
    }
}

fn verify_output(tool: &str, output: &Path) -> CoreResult<()> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(collaborator_error(
            tool,
            format!("output {} is empty", output.display()),
        )),
        Err(_) => Err(collaborator_error(
            tool,
            format!("no output written to {}", output.display()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressConfig;
    use tempfile::tempdir;

    #[test]
    fn test_verify_output_requires_content() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.mkv");
        assert!(verify_output("ffmpeg", &out).is_err());

        std::fs::write(&out, b"").unwrap();
        assert!(verify_output("ffmpeg", &out).is_err());

        std::fs::write(&out, b"matroska").unwrap();
        assert!(verify_output("ffmpeg", &out).is_ok());
    }

    #[test]
    fn test_default_cleanup_removes_input() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("title_t00.mkv");
        std::fs::write(&raw, b"raw").unwrap();

        let transcoder = transcoder_for(&CompressConfig::default());
        transcoder.cleanup(&raw).unwrap();
        assert!(!raw.exists());
        assert!(transcoder.cleanup(&raw).is_err());
    }
}

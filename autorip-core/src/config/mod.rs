//! Configuration structures and defaults for the autorip-core library.
//!
//! The configuration is read once at startup from a YAML file, validated, and
//! then passed by reference to every component. Every field has a default, so
//! an empty file is a valid (if not very useful) configuration.

mod builder;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use builder::CoreConfigBuilder;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Default ledger location, relative to the configuration file.
pub const DEFAULT_DATABASE: &str = "autorip.db";

/// Default time to wait for a stage lock before skipping the stage.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 1;

/// Default minimum track length in seconds. Shorter tracks are previews,
/// menus and extras rather than the feature.
pub const DEFAULT_MIN_LENGTH_SECS: u64 = 4000;

/// Default MakeMKV read cache in megabytes.
pub const DEFAULT_CACHE_MB: u32 = 1024;

/// Default scheduling niceness for the transcoder.
pub const DEFAULT_NICENESS: i32 = 15;

/// Default container extension for compressed output.
pub const DEFAULT_FORMAT: &str = "mkv";

/// Default subtitle language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default cap on post-processing commands launched per finalized title.
pub const DEFAULT_MAX_COMMANDS: usize = 8;

/// Main configuration structure for the autorip-core library.
///
/// # Examples
///
/// ```rust
/// use autorip_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .database(PathBuf::from("/var/lib/autorip/autorip.db"))
///     .save_path(PathBuf::from("/movies"))
///     .min_length(3600)
///     .extras(true)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Path of the SQLite ledger.
    pub database: PathBuf,
    pub lock: LockConfig,
    pub rip: RipConfig,
    pub compress: CompressConfig,
    pub extras: ExtrasConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            lock: LockConfig::default(),
            rip: RipConfig::default(),
            compress: CompressConfig::default(),
            extras: ExtrasConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Stage lock placement and wait budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Directory holding the lock files. Defaults to the OS temp directory.
    pub dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            dir: None,
            timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RipConfig {
    /// Root directory; each title is ripped into `<save_path>/<title>`.
    pub save_path: PathBuf,
    /// Minimum track length in seconds.
    pub min_length: u64,
    pub eject: bool,
    pub binary: String,
    pub cache_mb: u32,
}

impl Default for RipConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("."),
            min_length: DEFAULT_MIN_LENGTH_SECS,
            eject: true,
            binary: "makemkvcon".to_string(),
            cache_mb: DEFAULT_CACHE_MB,
        }
    }
}

/// Transcoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressMethod {
    Handbrake,
    Ffmpeg,
}

impl CompressMethod {
    pub fn default_binary(self) -> &'static str {
        match self {
            CompressMethod::Handbrake => "HandBrakeCLI",
            CompressMethod::Ffmpeg => "ffmpeg",
        }
    }

    /// Arguments used when the configuration does not supply any.
    pub fn default_args(self) -> Vec<String> {
        let args: &[&str] = match self {
            CompressMethod::Handbrake => &[
                "--encoder", "x264", "--quality", "20", "--all-audio", "--aencoder", "copy",
                "--all-subtitles",
            ],
            CompressMethod::Ffmpeg => &[
                "-map", "0", "-c:v", "libx264", "-crf", "20", "-preset", "medium", "-c:a",
                "copy", "-c:s", "copy",
            ],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub method: CompressMethod,
    /// Niceness the transcoder runs at (Unix only).
    pub nice: i32,
    /// Output container extension without the dot.
    pub format: String,
    /// Transcoder arguments; `None` selects the method's defaults.
    pub args: Option<Vec<String>>,
    /// Binary override; `None` selects the method's default binary.
    pub binary: Option<String>,
}

impl CompressConfig {
    pub fn binary(&self) -> &str {
        self.binary
            .as_deref()
            .unwrap_or_else(|| self.method.default_binary())
    }

    pub fn args(&self) -> Vec<String> {
        self.args
            .clone()
            .unwrap_or_else(|| self.method.default_args())
    }
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            method: CompressMethod::Handbrake,
            nice: DEFAULT_NICENESS,
            format: DEFAULT_FORMAT.to_string(),
            args: None,
            binary: None,
        }
    }
}

/// Rename, subtitles and post-processing commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtrasConfig {
    /// Captured into each new title as `extras_enabled`.
    pub enable: bool,
    pub subtitles: bool,
    pub language: String,
    pub binary: String,
    /// Shell commands launched after a title is finalized.
    pub commands: Vec<String>,
    pub max_commands: usize,
}

impl Default for ExtrasConfig {
    fn default() -> Self {
        Self {
            enable: false,
            subtitles: false,
            language: DEFAULT_LANGUAGE.to_string(),
            binary: "filebot".to_string(),
            commands: Vec::new(),
            max_commands: DEFAULT_MAX_COMMANDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Full ntfy topic URL, e.g. `https://ntfy.sh/my-rips`.
    pub ntfy_topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Optional log file in addition to the console.
    pub file: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads, resolves and validates the configuration file at `path`.
    ///
    /// Relative paths inside the file are resolved against the directory the
    /// file lives in.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses YAML without resolving paths or validating.
    pub fn from_yaml(text: &str) -> CoreResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Makes every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        resolve(&mut self.database, base);
        resolve(&mut self.rip.save_path, base);
        if let Some(dir) = self.lock.dir.as_mut() {
            resolve(dir, base);
        }
        if let Some(file) = self.logging.file.as_mut() {
            resolve(file, base);
        }
    }

    /// Checks ranges and required values.
    pub fn validate(&self) -> CoreResult<()> {
        if self.database.as_os_str().is_empty() {
            return Err(CoreError::Config("database path must not be empty".into()));
        }
        if self.rip.save_path.as_os_str().is_empty() {
            return Err(CoreError::Config("rip.save_path must not be empty".into()));
        }
        if self.rip.binary.trim().is_empty() {
            return Err(CoreError::Config("rip.binary must not be empty".into()));
        }
        if !(-20..=19).contains(&self.compress.nice) {
            return Err(CoreError::Config(format!(
                "compress.nice must be between -20 and 19, got {}",
                self.compress.nice
            )));
        }
        let format = self.compress.format.as_str();
        if format.is_empty() || format.contains(['.', '/', '\\']) {
            return Err(CoreError::Config(format!(
                "compress.format must be a bare extension such as 'mkv', got '{}'",
                format
            )));
        }
        if self.compress.binary().trim().is_empty() {
            return Err(CoreError::Config("compress.binary must not be empty".into()));
        }
        if self.extras.enable && self.extras.binary.trim().is_empty() {
            return Err(CoreError::Config("extras.binary must not be empty".into()));
        }
        if self.extras.subtitles && self.extras.language.trim().is_empty() {
            return Err(CoreError::Config(
                "extras.language is required when subtitles are enabled".into(),
            ));
        }
        if !self.extras.commands.is_empty() && self.extras.max_commands == 0 {
            return Err(CoreError::Config(
                "extras.max_commands must be at least 1 when commands are configured".into(),
            ));
        }
        if let Some(topic) = &self.notify.ntfy_topic {
            crate::notifications::parse_topic_url(topic)?;
        }
        Ok(())
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.lock.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock.timeout_secs)
    }
}

fn resolve(path: &mut PathBuf, base: &Path) {
    if path.is_relative() && !path.as_os_str().is_empty() {
        *path = base.join(&*path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = CoreConfig::from_yaml("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.lock_timeout(), Duration::from_secs(1));
        assert_eq!(config.compress.nice, 15);
        assert_eq!(config.compress.binary(), "HandBrakeCLI");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml_parses() {
        let yaml = r#"
database: /var/lib/autorip/autorip.db
lock: { dir: /run/autorip, timeout_secs: 5 }
rip: { save_path: /movies, min_length: 3000, eject: false, binary: makemkvcon, cache_mb: 512 }
compress:
  method: ffmpeg
  nice: 10
  format: mp4
  args: ["-c:v", "libx265"]
extras:
  enable: true
  subtitles: true
  language: de
  commands: ["curl -X POST http://plex.local/refresh"]
notify: { ntfy_topic: "https://ntfy.sh/rips" }
logging: { file: /var/log/autorip.log }
"#;
        let config = CoreConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.lock_dir(), PathBuf::from("/run/autorip"));
        assert_eq!(config.rip.min_length, 3000);
        assert!(!config.rip.eject);
        assert_eq!(config.compress.method, CompressMethod::Ffmpeg);
        assert_eq!(config.compress.binary(), "ffmpeg");
        assert_eq!(config.compress.args(), vec!["-c:v", "libx265"]);
        assert_eq!(config.extras.language, "de");
        assert_eq!(config.extras.max_commands, DEFAULT_MAX_COMMANDS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = CoreConfig::from_yaml("rip: { savePath: /movies }").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse(_)));
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let mut config = CoreConfig::default();
        config.compress.nice = 40;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.compress.format = ".mkv".into();
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.extras.subtitles = true;
        config.extras.language = String::new();
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.notify.ntfy_topic = Some("ntfy.sh/rips".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("autorip.yaml");
        std::fs::write(&file, "database: state/autorip.db\nrip: { save_path: movies }\n").unwrap();

        let config = CoreConfig::load(&file).unwrap();
        assert_eq!(config.database, dir.path().join("state/autorip.db"));
        assert_eq!(config.rip.save_path, dir.path().join("movies"));
        assert!(config.lock.dir.is_none());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = CoreConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}

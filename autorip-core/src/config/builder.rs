// ============================================================================
// autorip-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of a CoreConfig for tests and for embedding the
// library without a YAML file. Fields that are not set keep the defaults
// from `CoreConfig::default()`.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{CompressMethod, CoreConfig};

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ledger path.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the SQLite database file
    pub fn database(mut self, path: PathBuf) -> Self {
        self.config.database = path;
        self
    }

    /// Sets the directory that holds stage lock files.
    pub fn lock_dir(mut self, dir: PathBuf) -> Self {
        self.config.lock.dir = Some(dir);
        self
    }

    pub fn lock_timeout_secs(mut self, secs: u64) -> Self {
        self.config.lock.timeout_secs = secs;
        self
    }

    /// Sets the root directory titles are ripped into.
    pub fn save_path(mut self, path: PathBuf) -> Self {
        self.config.rip.save_path = path;
        self
    }

    /// Sets the minimum track length, in seconds, considered a feature.
    pub fn min_length(mut self, secs: u64) -> Self {
        self.config.rip.min_length = secs;
        self
    }

    pub fn eject(mut self, eject: bool) -> Self {
        self.config.rip.eject = eject;
        self
    }

    pub fn compress_method(mut self, method: CompressMethod) -> Self {
        self.config.compress.method = method;
        self
    }

    pub fn compress_format(mut self, format: &str) -> Self {
        self.config.compress.format = format.to_string();
        self
    }

    pub fn compress_args(mut self, args: Vec<String>) -> Self {
        self.config.compress.args = Some(args);
        self
    }

    pub fn niceness(mut self, nice: i32) -> Self {
        self.config.compress.nice = nice;
        self
    }

    /// Enables or disables the extras stage for titles created from now on.
    pub fn extras(mut self, enable: bool) -> Self {
        self.config.extras.enable = enable;
        self
    }

    /// Enables subtitle download in the given language.
    pub fn subtitles(mut self, language: &str) -> Self {
        self.config.extras.subtitles = true;
        self.config.extras.language = language.to_string();
        self
    }

    /// Adds a post-processing command run after a title is finalized.
    pub fn command(mut self, command: &str) -> Self {
        self.config.extras.commands.push(command.to_string());
        self
    }

    pub fn max_commands(mut self, max: usize) -> Self {
        self.config.extras.max_commands = max;
        self
    }

    /// Sets the ntfy topic URL for notifications.
    ///
    /// # Arguments
    ///
    /// * `topic` - Full topic URL, e.g. `https://ntfy.sh/my-rips`
    pub fn ntfy_topic(mut self, topic: &str) -> Self {
        self.config.notify.ntfy_topic = Some(topic.to_string());
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.config.logging.file = Some(path);
        self
    }

    /// Builds the configuration. Call `CoreConfig::validate` to check it.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = CoreConfigBuilder::new()
            .save_path(PathBuf::from("/movies"))
            .min_length(1200)
            .eject(false)
            .compress_method(CompressMethod::Ffmpeg)
            .extras(true)
            .subtitles("fr")
            .command("echo done")
            .build();

        assert_eq!(config.rip.save_path, PathBuf::from("/movies"));
        assert_eq!(config.rip.min_length, 1200);
        assert!(!config.rip.eject);
        assert_eq!(config.compress.binary(), "ffmpeg");
        assert!(config.extras.enable);
        assert!(config.extras.subtitles);
        assert_eq!(config.extras.language, "fr");
        assert_eq!(config.extras.commands, vec!["echo done"]);
        assert_eq!(config.compress.format, "mkv");
    }
}

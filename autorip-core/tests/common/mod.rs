// autorip-core/tests/common/mod.rs
//
// Scripted collaborators and a temp-dir harness shared by the integration
// tests. Each mock keeps its script and its call log behind Rc<RefCell<_>>,
// so a test holds one clone while the orchestrator owns another.

#![allow(dead_code)]

use autorip_core::config::CoreConfigBuilder;
use autorip_core::error::{CoreError, CoreResult};
use autorip_core::external::{Disc, DiscRipper, Ejector, Renamer, Track, Transcoder};
use autorip_core::notifications::{NotificationSender, NotificationType};
use autorip_core::{Collaborators, CoreConfig, Ledger, Orchestrator, RunSummary, Stage, Title};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn collaborator_failure(tool: &str, message: &str) -> CoreError {
    CoreError::Collaborator {
        tool: tool.to_string(),
        message: message.to_string(),
    }
}

pub fn disc(index: u32, label: &str) -> Disc {
    Disc {
        index,
        label: label.to_string(),
        location: format!("/dev/sr{}", index),
    }
}

pub fn track(index: u32, duration_secs: u64) -> Track {
    Track {
        index,
        duration_secs,
        file_name: format!("title_t{:02}.mkv", index),
    }
}

// ---------------------------------------------------------------------------
// Ripper
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockRipper {
    pub discs: Rc<RefCell<Vec<Disc>>>,
    pub tracks: Rc<RefCell<Vec<Track>>>,
    pub enumerate_error: Rc<RefCell<Option<String>>>,
    pub track_error: Rc<RefCell<Option<String>>>,
    pub extract_error: Rc<RefCell<Option<String>>>,
    /// (track index, destination directory) per extract call.
    pub extracted: Rc<RefCell<Vec<(u32, PathBuf)>>>,
}

impl MockRipper {
    pub fn with_disc(label: &str, tracks: Vec<Track>) -> Self {
        let ripper = Self::default();
        ripper.discs.borrow_mut().push(disc(0, label));
        *ripper.tracks.borrow_mut() = tracks;
        ripper
    }

    pub fn extract_calls(&self) -> usize {
        self.extracted.borrow().len()
    }
}

impl DiscRipper for MockRipper {
    fn enumerate_discs(&self) -> CoreResult<Vec<Disc>> {
        if let Some(message) = self.enumerate_error.borrow().as_ref() {
            return Err(CoreError::DependencyNotFound(message.clone()));
        }
        Ok(self.discs.borrow().clone())
    }

    fn track_info(&self, _disc: &Disc) -> CoreResult<Vec<Track>> {
        if let Some(message) = self.track_error.borrow().as_ref() {
            return Err(collaborator_failure("makemkvcon", message));
        }
        Ok(self.tracks.borrow().clone())
    }

    fn extract(&self, _disc: &Disc, track: &Track, dest: &Path) -> CoreResult<()> {
        self.extracted
            .borrow_mut()
            .push((track.index, dest.to_path_buf()));
        if let Some(message) = self.extract_error.borrow().as_ref() {
            return Err(collaborator_failure("makemkvcon", message));
        }
        std::fs::write(dest.join(&track.file_name), b"raw mpeg-2 stream")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transcoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TranscodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub args: Vec<String>,
    pub niceness: i32,
}

#[derive(Clone, Default)]
pub struct MockTranscoder {
    pub fail_with: Rc<RefCell<Option<String>>>,
    /// Leave a truncated output file behind when failing.
    pub leave_partial: Rc<RefCell<bool>>,
    pub calls: Rc<RefCell<Vec<TranscodeCall>>>,
}

impl MockTranscoder {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Transcoder for MockTranscoder {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        args: &[String],
        niceness: i32,
    ) -> CoreResult<()> {
        self.calls.borrow_mut().push(TranscodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            args: args.to_vec(),
            niceness,
        });
        if let Some(message) = self.fail_with.borrow().as_ref() {
            if *self.leave_partial.borrow() {
                std::fs::write(output, b"trunc")?;
            }
            return Err(collaborator_failure("HandBrakeCLI", message));
        }
        std::fs::write(output, b"h264")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Renamer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockRenamer {
    /// New file name, or the failure message.
    pub rename_result: Rc<RefCell<Result<String, String>>>,
    pub subtitle_result: Rc<RefCell<Result<bool, String>>>,
    pub rename_calls: Rc<RefCell<Vec<String>>>,
    pub subtitle_calls: Rc<RefCell<Vec<String>>>,
}

impl MockRenamer {
    pub fn renaming_to(new_file: &str) -> Self {
        Self {
            rename_result: Rc::new(RefCell::new(Ok(new_file.to_string()))),
            subtitle_result: Rc::new(RefCell::new(Ok(true))),
            rename_calls: Rc::default(),
            subtitle_calls: Rc::default(),
        }
    }
}

impl Default for MockRenamer {
    fn default() -> Self {
        Self::renaming_to("Renamed (2000).mkv")
    }
}

impl Renamer for MockRenamer {
    fn rename(&self, title: &Title) -> CoreResult<String> {
        self.rename_calls.borrow_mut().push(title.name.clone());
        let new_file = self
            .rename_result
            .borrow()
            .clone()
            .map_err(|message| collaborator_failure("filebot", &message))?;
        if let Some(current) = title.output_path() {
            std::fs::rename(current, title.source_path.join(&new_file))?;
        }
        Ok(new_file)
    }

    fn fetch_subtitles(&self, title: &Title, language: &str) -> CoreResult<bool> {
        self.subtitle_calls
            .borrow_mut()
            .push(format!("{}:{}", title.name, language));
        self.subtitle_result
            .borrow()
            .clone()
            .map_err(|message| collaborator_failure("filebot", &message))
    }
}

// ---------------------------------------------------------------------------
// Ejector and notifier
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockEjector {
    pub ejected: Rc<RefCell<Vec<String>>>,
    pub fail: Rc<RefCell<bool>>,
}

impl Ejector for MockEjector {
    fn eject(&self, location: &str) -> CoreResult<()> {
        self.ejected.borrow_mut().push(location.to_string());
        if *self.fail.borrow() {
            return Err(CoreError::Unsupported("tray is stuck".to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl NotificationSender for RecordingNotifier {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.get_title());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A temp directory holding the rip root, the lock directory and the ledger.
pub struct Harness {
    pub dir: TempDir,
    pub config: CoreConfig,
    pub ledger: Ledger,
    pub ripper: MockRipper,
    pub transcoder: MockTranscoder,
    pub renamer: MockRenamer,
    pub ejector: MockEjector,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new(configure: impl FnOnce(CoreConfigBuilder) -> CoreConfigBuilder) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let movies = dir.path().join("movies");
        std::fs::create_dir_all(&movies).expect("movies dir");

        let builder = CoreConfigBuilder::new()
            .database(dir.path().join("autorip.db"))
            .save_path(movies)
            .lock_dir(dir.path().join("locks"))
            .lock_timeout_secs(0);
        let config = configure(builder).build();
        config.validate().expect("valid config");
        let ledger = Ledger::open(&config.database).expect("ledger");

        Self {
            dir,
            config,
            ledger,
            ripper: MockRipper::default(),
            transcoder: MockTranscoder::default(),
            renamer: MockRenamer::default(),
            ejector: MockEjector::default(),
            notifier: RecordingNotifier::default(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ripper: Box::new(self.ripper.clone()),
            transcoder: Box::new(self.transcoder.clone()),
            renamer: Box::new(self.renamer.clone()),
            ejector: Box::new(self.ejector.clone()),
            notifier: Some(Box::new(self.notifier.clone())),
        }
    }

    pub fn run(&self, stages: &[Stage]) -> CoreResult<RunSummary> {
        Orchestrator::new(&self.config, &self.ledger, self.collaborators()).run(stages)
    }

    pub fn movie_dir(&self, name: &str) -> PathBuf {
        self.config.rip.save_path.join(name)
    }

    pub fn only_title(&self) -> Title {
        let titles = self.ledger.list_titles(None).expect("list titles");
        assert_eq!(titles.len(), 1, "expected exactly one title, got {titles:?}");
        titles.into_iter().next().expect("one title")
    }

    pub fn messages(&self, title: &Title) -> Vec<String> {
        self.ledger
            .history_for(title.id)
            .expect("history")
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }

    /// Records a title that has already been ripped into `file`.
    pub fn ripped_title(&self, name: &str, file: &str, extras: bool) -> Title {
        use autorip_core::TitleStatus;
        let path = self.movie_dir(name);
        std::fs::create_dir_all(&path).expect("title dir");
        std::fs::write(path.join(file), b"raw").expect("raw file");

        let mut title = self
            .ledger
            .create_title(name, &path, extras)
            .expect("create title");
        self.ledger
            .update_status(&mut title, TitleStatus::Ripping, Some(file))
            .expect("ripping");
        self.ledger
            .update_status(&mut title, TitleStatus::Ripped, None)
            .expect("ripped");
        title
    }
}

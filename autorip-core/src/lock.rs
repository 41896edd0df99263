// ============================================================================
// autorip-core/src/lock.rs
// ============================================================================
//
// STAGE LOCKS: Cross-Process Mutual Exclusion per Pipeline Stage
//
// Each stage owns one lock file (`autorip_<stage>.lock`) in the lock
// directory. Holding an exclusive advisory lock on that file is what allows a
// process to run the stage. Different stages use different files, so a rip
// and a compress may run side by side while two rips may not.
//
// The operating system releases advisory locks when the holding process
// exits, however it exits, so a lock left behind by a killed process is
// reclaimed on the next acquisition attempt. The holder's PID is written into
// the file for diagnostics only.
//
// AI-ASSISTANT-INFO: fs2-based stage locks with bounded acquisition wait

// ---- External crate imports ----
use fs2::FileExt;

// ---- Standard library imports ----
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::stage::Stage;

/// Interval between acquisition attempts while waiting for a lock.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of trying to run a body under a stage lock.
#[derive(Debug)]
pub enum LockOutcome<T> {
    /// The lock was acquired and the body ran; this is its return value.
    Acquired(T),
    /// Another process holds the lock; the body did not run.
    NotAcquired,
}

impl<T> LockOutcome<T> {
    pub fn is_acquired(&self) -> bool {
        matches!(self, LockOutcome::Acquired(_))
    }
}

/// Factory for per-stage locks sharing one directory and wait budget.
#[derive(Debug, Clone)]
pub struct StageLocks {
    dir: PathBuf,
    max_wait: Duration,
}

impl StageLocks {
    pub fn new(dir: impl Into<PathBuf>, max_wait: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_wait,
        }
    }

    pub fn lock_path(&self, stage: Stage) -> PathBuf {
        self.dir.join(format!("autorip_{}.lock", stage.name()))
    }

    /// Runs `body` exactly once if the stage lock can be taken within the
    /// configured wait. The lock is released when this returns or unwinds.
    pub fn with_stage_lock<T, F>(&self, stage: Stage, body: F) -> CoreResult<LockOutcome<T>>
    where
        F: FnOnce() -> T,
    {
        match self.acquire(stage)? {
            Some(guard) => {
                let value = body();
                drop(guard);
                Ok(LockOutcome::Acquired(value))
            }
            None => Ok(LockOutcome::NotAcquired),
        }
    }

    /// Tries to take the lock, polling until `max_wait` elapses.
    pub fn acquire(&self, stage: Stage) -> CoreResult<Option<StageLockGuard>> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CoreError::Lock(format!(
                "cannot create lock directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.lock_path(stage);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CoreError::Lock(format!("cannot open '{}': {}", path.display(), e)))?;

        // A wait too long to represent has no deadline.
        let deadline = Instant::now().checked_add(self.max_wait);
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    let guard = StageLockGuard { file, path, stage };
                    guard.record_holder();
                    log::debug!("Acquired {} lock", stage);
                    return Ok(Some(guard));
                }
                Err(e) if is_contended(&e) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        log_holder(stage, &path);
                        return Ok(None);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(CoreError::Lock(format!(
                        "cannot lock '{}': {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }
}

/// Held stage lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct StageLockGuard {
    file: File,
    path: PathBuf,
    stage: Stage,
}

impl StageLockGuard {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_holder(&self) {
        let stamp = format!(
            "{} {}\n",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        let written = self
            .file
            .set_len(0)
            .and_then(|_| (&self.file).write_all(stamp.as_bytes()));
        if let Err(e) = written {
            log::debug!("Could not record holder in {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for StageLockGuard {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release {} lock: {}", self.stage, e);
        } else {
            log::debug!("Released {} lock", self.stage);
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Logs who holds a contended lock, as recorded in the lock file.
fn log_holder(stage: Stage, path: &Path) {
    let recorded = std::fs::read_to_string(path).unwrap_or_default();
    let mut parts = recorded.split_whitespace();
    match (parts.next().and_then(|p| p.parse::<u32>().ok()), parts.next()) {
        (Some(pid), since) => log::debug!(
            "{} lock held by pid {}{} since {}",
            stage,
            pid,
            match pid_alive(pid) {
                Some(true) => ", alive",
                Some(false) => ", not running",
                None => "",
            },
            since.unwrap_or("unknown")
        ),
        (None, _) => log::debug!("{} lock held by an unknown process", stage),
    }
}

#[cfg(target_os = "linux")]
fn pid_alive(pid: u32) -> Option<bool> {
    Some(Path::new("/proc").join(pid.to_string()).exists())
}

#[cfg(not(target_os = "linux"))]
fn pid_alive(_pid: u32) -> Option<bool> {
    None
}

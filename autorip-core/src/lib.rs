//! Core library for the autorip optical media acquisition pipeline.
//!
//! A title moves through three independently runnable stages: rip (extract
//! the feature from an inserted disc), compress (transcode it) and extras
//! (rename it, fetch subtitles, finalize). Progress is recorded in a SQLite
//! ledger shared by every invocation, and each stage is guarded by a
//! cross-process lock so overlapping invocations never duplicate work.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use autorip_core::{Collaborators, CoreConfig, Ledger, Orchestrator, Stage};
//! use std::path::Path;
//!
//! let config = CoreConfig::load(Path::new("/etc/autorip/settings.yaml")).unwrap();
//! let ledger = Ledger::open(&config.database).unwrap();
//! let collaborators = Collaborators::from_config(&config).unwrap();
//!
//! let summary = Orchestrator::new(&config, &ledger, collaborators)
//!     .run(&Stage::ALL)
//!     .unwrap();
//! for (stage, outcome) in &summary.stages {
//!     println!("{stage}: {outcome:?}");
//! }
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod external;
pub mod hooks;
pub mod ledger;
pub mod lock;
pub mod notifications;
pub mod orchestrator;
pub mod selftest;
pub mod stage;
pub mod status;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use drivers::{StageContext, StageReport};
pub use error::{CoreError, CoreResult};
pub use ledger::{HistoryEntry, Ledger, Severity, Title};
pub use lock::{LockOutcome, StageLocks};
pub use orchestrator::{Collaborators, Orchestrator, RunSummary, StageOutcome};
pub use selftest::{SelfTestReport, run_self_test};
pub use stage::Stage;
pub use status::TitleStatus;
pub use utils::{format_bytes, format_duration};

//! Environment self-test.
//!
//! Checks that the configuration is usable and that every tool it needs can
//! be started. The ledger is only ever opened read-only here.

use serde::Serialize;
use std::path::Path;

use crate::config::{CompressMethod, CoreConfig};
use crate::external::{SystemEjector, check_dependency};
use crate::ledger::Ledger;

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelfTestReport {
    pub checks: Vec<Check>,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Runs every check. Never creates the ledger or modifies it.
pub fn run_self_test(config: &CoreConfig) -> SelfTestReport {
    let mut checks = Vec::new();

    checks.push(match config.validate() {
        Ok(()) => Check::pass("configuration", "valid"),
        Err(e) => Check::fail("configuration", e.to_string()),
    });

    checks.push(directory_check("rip.save_path", &config.rip.save_path));
    checks.push(directory_check("lock.dir", &config.lock_dir()));

    checks.push(tool_check("ripper", &config.rip.binary, "--help"));
    let check_arg = match config.compress.method {
        CompressMethod::Handbrake => "--version",
        CompressMethod::Ffmpeg => "-version",
    };
    checks.push(tool_check("transcoder", config.compress.binary(), check_arg));
    if config.extras.enable {
        checks.push(tool_check("renamer", &config.extras.binary, "-version"));
    }
    if config.rip.eject {
        checks.push(match SystemEjector::binary() {
            Some(binary) => tool_check("ejector", binary, "--help"),
            None => Check::fail(
                "ejector",
                format!("ejecting is not supported on {}", std::env::consts::OS),
            ),
        });
    }

    checks.push(ledger_check(&config.database));

    for check in &checks {
        if check.passed {
            log::debug!("Self-test {}: ok ({})", check.name, check.detail);
        } else {
            log::warn!("Self-test {}: FAILED ({})", check.name, check.detail);
        }
    }
    SelfTestReport { checks }
}

fn directory_check(name: &str, path: &Path) -> Check {
    if path.is_dir() {
        Check::pass(name, path.display().to_string())
    } else {
        Check::fail(name, format!("{} is not a directory", path.display()))
    }
}

fn tool_check(name: &str, binary: &str, check_arg: &str) -> Check {
    match check_dependency(binary, check_arg) {
        Ok(()) => Check::pass(name, binary),
        Err(e) => Check::fail(name, e.to_string()),
    }
}

fn ledger_check(path: &Path) -> Check {
    if !path.exists() {
        return Check::pass(
            "ledger",
            format!("{} does not exist yet and will be created on first run", path.display()),
        );
    }
    match Ledger::open_read_only(path).and_then(|ledger| ledger.status_counts()) {
        Ok(counts) => {
            let total: u64 = counts.iter().map(|(_, n)| n).sum();
            Check::pass("ledger", format!("{} ({} titles)", path.display(), total))
        }
        Err(e) => Check::fail("ledger", e.to_string()),
    }
}

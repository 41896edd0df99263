//! Drive tray ejection.

use std::process::Command;

use crate::error::{CoreError, CoreResult};
use crate::external::Ejector;
use crate::util::command::run_command;

/// Ejects through the platform's command-line tool.
#[derive(Debug, Clone, Default)]
pub struct SystemEjector;

impl SystemEjector {
    /// The binary this platform ejects with, if any.
    pub fn binary() -> Option<&'static str> {
        if cfg!(target_os = "linux") {
            Some("eject")
        } else if cfg!(target_os = "macos") {
            Some("drutil")
        } else {
            None
        }
    }
}

impl Ejector for SystemEjector {
    fn eject(&self, location: &str) -> CoreResult<()> {
        log::debug!("Ejecting drive: {}", location);
        let mut cmd = match Self::binary() {
            Some("eject") => {
                let mut cmd = Command::new("eject");
                cmd.arg("-vm").arg(location);
                cmd
            }
            Some(binary) => {
                let mut cmd = Command::new(binary);
                cmd.arg("eject").arg(location);
                cmd
            }
            None => {
                return Err(CoreError::Unsupported(format!(
                    "ejecting drives on {}",
                    std::env::consts::OS
                )));
            }
        };

        let output = run_command(&mut cmd)?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("{}", line.trim());
        }
        Ok(())
    }
}

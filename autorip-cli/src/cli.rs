// autorip-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use autorip_core::Stage;
use clap::{ArgGroup, Parser};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Autorip: rip, compress and rename optical media",
    long_about = "Runs the rip, compress and extras stages of the autorip pipeline. \
                  Each stage is locked so overlapping invocations never duplicate work."
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["rip", "compress", "extra", "all", "test", "status"])
))]
pub struct Cli {
    /// Rip the main feature of every inserted disc
    #[arg(long)]
    pub rip: bool,

    /// Compress the next ripped title
    #[arg(long)]
    pub compress: bool,

    /// Rename, fetch subtitles for and finalize the next compressed title
    #[arg(long)]
    pub extra: bool,

    /// Run every stage in pipeline order
    #[arg(long)]
    pub all: bool,

    /// Check the configuration and the external tools, then exit
    #[arg(long)]
    pub test: bool,

    /// Print a summary of the ledger
    #[arg(long)]
    pub status: bool,

    /// Print the status summary as JSON
    #[arg(long, requires = "status")]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Suppress console logging
    #[arg(long)]
    pub silent: bool,

    /// Settings file to load.
    /// Can also be set via the AUTORIP_CONFIG environment variable.
    #[arg(long, value_name = "FILE", env = "AUTORIP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Stages selected by the flags, in pipeline order.
    pub fn stages(&self) -> Vec<Stage> {
        if self.all {
            return Stage::ALL.to_vec();
        }
        [
            (self.rip, Stage::Rip),
            (self.compress, Stage::Compress),
            (self.extra, Stage::Extras),
        ]
        .into_iter()
        .filter_map(|(selected, stage)| selected.then_some(stage))
        .collect()
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("autorip").chain(args.iter().copied()))
    }

    #[test]
    fn test_a_mode_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--debug"]).is_err());
    }

    #[test]
    fn test_stage_flags_combine_in_pipeline_order() {
        let cli = parse(&["--extra", "--rip"]).unwrap();
        assert_eq!(cli.stages(), vec![Stage::Rip, Stage::Extras]);

        let cli = parse(&["--all", "--compress"]).unwrap();
        assert_eq!(cli.stages(), Stage::ALL.to_vec());
    }

    #[test]
    fn test_json_requires_status() {
        assert!(parse(&["--rip", "--json"]).is_err());
        let cli = parse(&["--status", "--json"]).unwrap();
        assert!(cli.json && cli.stages().is_empty());
    }

    #[test]
    fn test_debug_raises_log_level() {
        assert_eq!(parse(&["--rip"]).unwrap().log_level(), LevelFilter::Info);
        assert_eq!(
            parse(&["--rip", "--debug"]).unwrap().log_level(),
            LevelFilter::Debug
        );
    }
}

//! Command implementations for the CLI.
//!
//! Each submodule implements one mode flag.

/// Stage flags: `--rip`, `--compress`, `--extra` and `--all`.
pub mod run;
pub mod selftest;
pub mod status;

pub use run::run_stages;
pub use selftest::run_test;
pub use status::run_status;

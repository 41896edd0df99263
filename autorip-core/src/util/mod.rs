//! Process execution helpers shared by the external tool wrappers and the
//! post-processing hooks.

pub mod command;

pub use command::{capture_command, niced, run_command, run_streaming, spawn_detached};

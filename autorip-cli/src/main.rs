// autorip-cli/src/main.rs
//
// Entry point for the `autorip` binary.
//
// Loads the settings, installs logging and runs the selected modes in a fixed
// order: self-test, status, then the pipeline stages. The exit code is 0
// whenever the invocation ran, whatever work it found; it is 1 on a
// configuration error, a ledger failure or a failed self-test.

use autorip_cli::{Cli, CliResult, commands, config, logging, report_fatal};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CliResult<ExitCode> {
    let config = config::load_config(cli.config.as_deref())?;
    logging::init_logging(cli.log_level(), cli.silent, config.logging.file.as_deref())?;

    if cli.test && !commands::run_test(&config).passed() {
        return Ok(ExitCode::FAILURE);
    }
    if cli.status {
        commands::run_status(&config, cli.json)?;
    }

    let stages = cli.stages();
    if !stages.is_empty() {
        commands::run_stages(&config, &stages)?;
    }
    Ok(ExitCode::SUCCESS)
}

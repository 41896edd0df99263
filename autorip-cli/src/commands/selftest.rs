//! Implementation of `--test`.

use autorip_core::{CoreConfig, SelfTestReport, run_self_test};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Runs the self-test and prints one line per check to stdout.
pub fn run_test(config: &CoreConfig) -> SelfTestReport {
    let report = run_self_test(config);
    let color = std::io::stdout().is_terminal();

    for check in &report.checks {
        let mark = match (check.passed, color) {
            (true, true) => "ok".green().to_string(),
            (false, true) => "FAIL".red().bold().to_string(),
            (true, false) => "ok".to_string(),
            (false, false) => "FAIL".to_string(),
        };
        println!("{:<14} {:<4} {}", check.name, mark, check.detail);
    }

    let failures = report.failures().count();
    if failures == 0 {
        println!("All {} checks passed", report.checks.len());
    } else {
        println!("{} of {} checks failed", failures, report.checks.len());
    }
    report
}

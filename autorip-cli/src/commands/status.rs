//! Implementation of `--status`.
//!
//! Reads the ledger without modifying it and prints per-status counts plus
//! every title, either as text or as JSON for dashboards.

use crate::error::CliResult;

use autorip_core::{CoreConfig, CoreError, Ledger, Title, TitleStatus};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: TitleStatus,
    pub code: i64,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub database: &'a Path,
    pub exists: bool,
    pub counts: Vec<StatusCount>,
    pub titles: Vec<Title>,
}

/// Collects the ledger summary. A missing ledger reads as empty.
pub fn collect_status(config: &CoreConfig) -> CliResult<StatusReport<'_>> {
    let database = config.database.as_path();
    let (counts, titles) = if database.is_file() {
        let ledger = Ledger::open_read_only(database)?;
        (ledger.status_counts()?, ledger.list_titles(None)?)
    } else {
        let zeroes = TitleStatus::ALL.iter().map(|s| (*s, 0)).collect();
        (zeroes, Vec::new())
    };

    Ok(StatusReport {
        database,
        exists: database.is_file(),
        counts: counts
            .into_iter()
            .map(|(status, count)| StatusCount {
                status,
                code: status.code(),
                count,
            })
            .collect(),
        titles,
    })
}

pub fn run_status(config: &CoreConfig, json: bool) -> CliResult<()> {
    let report = collect_status(config)?;
    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| {
            CoreError::OperationFailed(format!("Cannot serialize status: {}", e))
        })?;
        println!("{}", text);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

fn render_text(report: &StatusReport<'_>) -> String {
    let mut out = String::new();
    let total: u64 = report.counts.iter().map(|c| c.count).sum();
    if report.exists {
        out.push_str(&format!(
            "Ledger {} ({} titles)\n",
            report.database.display(),
            total
        ));
    } else {
        out.push_str(&format!(
            "Ledger {} does not exist yet\n",
            report.database.display()
        ));
    }
    for count in &report.counts {
        out.push_str(&format!("  {:<12} {}\n", count.status.name(), count.count));
    }
    if !report.titles.is_empty() {
        out.push_str("Titles:\n");
        for title in &report.titles {
            out.push_str(&format!(
                "  #{:<4} {:<12} {} ({})\n",
                title.id,
                title.status.name(),
                title.name,
                title.updated_at.format("%Y-%m-%d %H:%M")
            ));
        }
    }
    out
}

//! Compress driver: transcodes one ripped title per run.

use std::path::Path;

use crate::error::CoreResult;
use crate::external::Transcoder;
use crate::ledger::{Severity, Title};
use crate::notifications::NotificationType;
use crate::stage::Stage;
use crate::status::TitleStatus;
use crate::utils::{Stopwatch, hostname};

use super::{StageContext, StageReport, advance, claim};

/// Compresses the next eligible title, if any.
///
/// A failed attempt leaves the title in `Compressing`, from where the next run
/// claims it again once no fresh `Ripped` title is waiting.
pub fn run_compress(ctx: &StageContext<'_>, transcoder: &dyn Transcoder) -> CoreResult<StageReport> {
    let mut report = StageReport::new(Stage::Compress);

    let Some(mut title) = ctx.ledger.find_next_eligible(Stage::Compress)? else {
        log::info!("[compress] Queue is empty");
        return Ok(report);
    };

    let Some(input) = title.output_path().filter(|p| p.is_file()) else {
        log::error!(
            "[compress] Input for {} no longer exists in {}",
            title.name,
            title.source_path.display()
        );
        advance(
            ctx.ledger,
            &mut title,
            TitleStatus::RipFailed,
            None,
            "input file no longer exists",
            Severity::Failure,
        )?;
        ctx.notify_failure(Stage::Compress, &title, "input file no longer exists");
        report.failed.push(title.name);
        return Ok(report);
    };

    if !claim(ctx.ledger, &mut title, TitleStatus::Compressing, "compression started")? {
        report.skipped.push(title.name);
        return Ok(report);
    }

    let output_file = output_name(&title, &ctx.config.compress.format);
    let output = title.source_path.join(&output_file);
    log::info!("[compress] Compressing {} into {}", title.name, output_file);

    let watch = Stopwatch::start();
    let result = transcoder.transcode(
        &input,
        &output,
        &ctx.config.compress.args(),
        ctx.config.compress.nice,
    );

    match result {
        Ok(()) => {
            log::info!(
                "[compress] It took {} minute(s) to compress {}",
                watch.minutes(),
                title.name
            );
            let input_size = file_size(&input);
            let output_size = file_size(&output);
            advance(
                ctx.ledger,
                &mut title,
                TitleStatus::Compressed,
                Some(&output_file),
                &format!("compression succeeded ({} min)", watch.minutes()),
                Severity::Normal,
            )?;

            if let Err(e) = transcoder.cleanup(&input) {
                log::warn!("[compress] Could not remove {}: {}", input.display(), e);
            }
            ctx.notify(NotificationType::CompressComplete {
                title: title.name.clone(),
                input_size,
                output_size,
                duration: watch.elapsed(),
                hostname: hostname(),
            });
            report.succeeded.push(title.name);
        }
        Err(e) => {
            let message = format!("compression failed: {}", e);
            log::error!("[compress] {}: {}", title.name, message);
            remove_partial(&output);
            advance(
                ctx.ledger,
                &mut title,
                TitleStatus::Compressing,
                None,
                &message,
                Severity::Failure,
            )?;
            ctx.notify_failure(Stage::Compress, &title, &message);
            report.failed.push(title.name);
        }
    }
    Ok(report)
}

/// `<name>.<format>`, or `<name>.compressed.<format>` when that would
/// overwrite the input.
pub(crate) fn output_name(title: &Title, format: &str) -> String {
    let plain = format!("{}.{}", title.name, format);
    if title.output_file.as_deref() == Some(plain.as_str()) {
        format!("{}.compressed.{}", title.name, format)
    } else {
        plain
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn remove_partial(output: &Path) {
    if output.exists() {
        match std::fs::remove_file(output) {
            Ok(()) => log::debug!("[compress] Removed partial output {}", output.display()),
            Err(e) => log::warn!(
                "[compress] Could not remove partial output {}: {}",
                output.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn ripped(output_file: &str) -> Title {
        Title {
            id: 1,
            name: "Heat".into(),
            source_path: PathBuf::from("/movies/Heat"),
            status: TitleStatus::Ripped,
            output_file: Some(output_file.into()),
            extras_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_output_name_avoids_overwriting_input() {
        assert_eq!(output_name(&ripped("title_t00.mkv"), "mkv"), "Heat.mkv");
        assert_eq!(output_name(&ripped("Heat.mkv"), "mkv"), "Heat.compressed.mkv");
        assert_eq!(output_name(&ripped("Heat.mkv"), "mp4"), "Heat.mp4");
    }
}

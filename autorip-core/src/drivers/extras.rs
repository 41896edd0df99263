//! Extras driver: renames a compressed title, fetches subtitles and
//! finalizes it.

use crate::error::CoreResult;
use crate::external::Renamer;
use crate::hooks::dispatch_post_commands;
use crate::ledger::Severity;
use crate::notifications::NotificationType;
use crate::stage::Stage;
use crate::status::TitleStatus;
use crate::utils::{file_stem, hostname};

use super::{StageContext, StageReport, advance, claim};

/// Runs extras for the next eligible title, if any.
pub fn run_extras(ctx: &StageContext<'_>, renamer: &dyn Renamer) -> CoreResult<StageReport> {
    let mut report = StageReport::new(Stage::Extras);
    let extras = &ctx.config.extras;

    let Some(mut title) = ctx.ledger.find_next_eligible(Stage::Extras)? else {
        log::info!("[extras] No titles ready for extras");
        return Ok(report);
    };

    if !claim(ctx.ledger, &mut title, TitleStatus::Renaming, "submitted to renamer")? {
        report.skipped.push(title.name);
        return Ok(report);
    }
    log::info!("[extras] Attempting rename of {}", title.name);

    let new_file = match renamer.rename(&title) {
        Ok(new_file) => new_file,
        Err(e) => {
            let message = format!("rename failed: {}", e);
            log::error!("[extras] {}: {}", title.name, message);
            advance(
                ctx.ledger,
                &mut title,
                TitleStatus::Renaming,
                None,
                &message,
                Severity::Failure,
            )?;
            ctx.notify_failure(Stage::Extras, &title, &message);
            report.failed.push(title.name);
            return Ok(report);
        }
    };

    ctx.ledger.rename_title(&mut title, &file_stem(&new_file))?;
    advance(
        ctx.ledger,
        &mut title,
        TitleStatus::Compressed,
        Some(&new_file),
        &format!("renamed to {}", new_file),
        Severity::Normal,
    )?;
    log::info!("[extras] Renamed to {}", new_file);

    let message = if extras.subtitles {
        log::info!("[extras] Grabbing {} subtitles", extras.language);
        match renamer.fetch_subtitles(&title, &extras.language) {
            Ok(true) => "subtitles downloaded",
            Ok(false) => {
                log::info!("[extras] No subtitle match for {}", title.name);
                "no subtitles found"
            }
            Err(e) => {
                log::warn!("[extras] Subtitle lookup for {} failed: {}", title.name, e);
                "no subtitles found"
            }
        }
    } else {
        "finalized"
    };
    advance(
        ctx.ledger,
        &mut title,
        TitleStatus::Finalized,
        None,
        message,
        Severity::Normal,
    )?;
    log::info!("[extras] Completed work on {}", title.name);

    dispatch_post_commands(&extras.commands, extras.max_commands, &title);
    ctx.notify(NotificationType::TitleFinalized {
        title: title.name.clone(),
        path: title.output_path().unwrap_or_else(|| title.source_path.clone()),
        hostname: hostname(),
    });
    report.succeeded.push(title.name);
    Ok(report)
}

//! Rip driver: turns inserted discs into `Ripped` titles.
//!
//! Unlike the other stages, rip discovers its work from the drives rather
//! than the ledger. The title directory doubles as a guard: a disc whose
//! directory already exists is never ripped again unless its record says the
//! previous rip failed or was interrupted.

use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::external::{Disc, DiscRipper, Ejector, Track};
use crate::ledger::{Severity, Title};
use crate::notifications::NotificationType;
use crate::stage::Stage;
use crate::status::TitleStatus;
use crate::utils::{Stopwatch, format_duration, hostname};

use super::{StageContext, StageReport, advance};

/// Rips the main feature of every inserted disc.
///
/// Ejects each disc afterwards when `rip.eject` is set, whatever happened to
/// it. Only ledger failures are returned as errors.
pub fn run_rip(
    ctx: &StageContext<'_>,
    ripper: &dyn DiscRipper,
    ejector: &dyn Ejector,
) -> CoreResult<StageReport> {
    let mut report = StageReport::new(Stage::Rip);

    let discs = match ripper.enumerate_discs() {
        Ok(discs) => discs,
        Err(e) => {
            log::error!("[rip] Could not list drives: {}", e);
            return Ok(report);
        }
    };
    if discs.is_empty() {
        log::info!("[rip] Could not find any discs in drive list");
        return Ok(report);
    }
    log::debug!("[rip] {} disc(s) found", discs.len());

    for disc in &discs {
        let result = rip_disc(ctx, ripper, disc, &mut report);

        if ctx.config.rip.eject {
            if let Err(e) = ejector.eject(&disc.location) {
                log::warn!("[rip] Could not eject {}: {}", disc.location, e);
            }
        }
        result?;
    }
    Ok(report)
}

fn rip_disc(
    ctx: &StageContext<'_>,
    ripper: &dyn DiscRipper,
    disc: &Disc,
    report: &mut StageReport,
) -> CoreResult<()> {
    let name = ripper.canonical_title(disc);
    let path = ctx.config.rip.save_path.join(&name);

    let Some(mut title) = prepare_title(ctx, &name, &path, report)? else {
        return Ok(());
    };

    let tracks = match ripper.track_info(disc) {
        Ok(tracks) => tracks,
        Err(e) => {
            let message = format!("track scan failed: {}", e);
            log::error!("[rip] {}: {}", name, message);
            record_failure(ctx, &mut title, &message)?;
            report.failed.push(name);
            return Ok(());
        }
    };

    let Some(track) = main_feature(tracks, ctx.config.rip.min_length) else {
        log::info!(
            "[rip] No titles on {} are at least {} long; try lowering rip.min_length",
            name,
            format_duration(ctx.config.rip.min_length)
        );
        ctx.ledger
            .append_history(&title, "no titles found", Severity::Normal);
        report.skipped.push(name);
        return Ok(());
    };

    advance(
        ctx.ledger,
        &mut title,
        TitleStatus::Ripping,
        Some(&track.file_name),
        "submitted to ripper",
        Severity::Normal,
    )?;
    log::info!(
        "[rip] Ripping {} (track {}, {})",
        name,
        track.index,
        format_duration(track.duration_secs)
    );

    let watch = Stopwatch::start();
    match ripper.extract(disc, &track, &title.source_path) {
        Ok(()) => {
            log::info!("[rip] It took {} minute(s) to rip {}", watch.minutes(), name);
            advance(
                ctx.ledger,
                &mut title,
                TitleStatus::Ripped,
                None,
                &format!("rip succeeded ({} min)", watch.minutes()),
                Severity::Normal,
            )?;
            ctx.notify(NotificationType::RipComplete {
                title: title.name.clone(),
                duration: watch.elapsed(),
                hostname: hostname(),
            });
            report.succeeded.push(name);
        }
        Err(e) => {
            let message = format!("rip failed: {}", e);
            log::error!("[rip] {}: {}", name, message);
            record_failure(ctx, &mut title, &message)?;
            report.failed.push(name);
        }
    }
    Ok(())
}

/// Finds or creates the record a disc is ripped under.
///
/// Returns `None` when the disc must be skipped.
fn prepare_title(
    ctx: &StageContext<'_>,
    name: &str,
    path: &Path,
    report: &mut StageReport,
) -> CoreResult<Option<Title>> {
    if let Some(mut existing) = ctx.ledger.find_by_path(path)? {
        // Rips run one at a time under the stage lock, so a record still in
        // Ripping was left by a process that died mid-rip.
        if existing.status == TitleStatus::Ripping {
            log::warn!("[rip] Previous rip of {} was interrupted", name);
            advance(
                ctx.ledger,
                &mut existing,
                TitleStatus::RipFailed,
                None,
                "rip interrupted",
                Severity::Failure,
            )?;
        }
        if Stage::Rip.precondition().admits(&existing) {
            log::info!("[rip] Retrying failed rip of {}", name);
            return Ok(Some(existing));
        }
        log::info!(
            "[rip] {} is already tracked ({}), skipping",
            name,
            existing.status
        );
        report.skipped.push(name.to_string());
        return Ok(None);
    }

    if path.exists() {
        log::info!("[rip] Movie folder {} already exists, skipping", path.display());
        report.skipped.push(name.to_string());
        return Ok(None);
    }

    if let Err(e) = std::fs::create_dir_all(path) {
        log::error!("[rip] Could not create {}: {}", path.display(), e);
        report.failed.push(name.to_string());
        return Ok(None);
    }

    match ctx
        .ledger
        .create_title(name, path, ctx.config.extras.enable)
    {
        Ok(title) => Ok(Some(title)),
        Err(CoreError::DuplicatePath(_)) => {
            log::info!("[rip] {} was recorded by another process, skipping", name);
            report.skipped.push(name.to_string());
            Ok(None)
        }
        Err(e) => {
            if let Err(rm) = std::fs::remove_dir(path) {
                log::warn!("[rip] Could not remove {}: {}", path.display(), rm);
            }
            Err(e)
        }
    }
}

/// Longest track meeting the minimum length. Ties go to the lower index.
fn main_feature(tracks: Vec<Track>, min_length: u64) -> Option<Track> {
    tracks
        .into_iter()
        .filter(|t| t.duration_secs >= min_length)
        .max_by(|a, b| {
            a.duration_secs
                .cmp(&b.duration_secs)
                .then_with(|| b.index.cmp(&a.index))
        })
}

/// Moves the title to `RipFailed`, or only records the failure if it is
/// already there (a failed retry).
fn record_failure(ctx: &StageContext<'_>, title: &mut Title, message: &str) -> CoreResult<()> {
    if title.status == TitleStatus::RipFailed {
        ctx.ledger.append_history(title, message, Severity::Failure);
    } else {
        advance(
            ctx.ledger,
            title,
            TitleStatus::RipFailed,
            None,
            message,
            Severity::Failure,
        )?;
    }
    ctx.notify_failure(Stage::Rip, title, message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(index: u32, duration_secs: u64) -> Track {
        Track {
            index,
            duration_secs,
            file_name: format!("title_t{:02}.mkv", index),
        }
    }

    #[test]
    fn test_main_feature_is_longest_eligible_track() {
        let tracks = vec![track(0, 600), track(1, 8887), track(2, 5000)];
        assert_eq!(main_feature(tracks, 4000).unwrap().index, 1);
    }

    #[test]
    fn test_main_feature_ties_prefer_first_track() {
        let tracks = vec![track(3, 7000), track(1, 7000)];
        assert_eq!(main_feature(tracks, 4000).unwrap().index, 1);
    }

    #[test]
    fn test_short_tracks_are_ignored() {
        let tracks = vec![track(0, 600), track(1, 3999)];
        assert!(main_feature(tracks, 4000).is_none());
        assert!(main_feature(Vec::new(), 0).is_none());
    }
}

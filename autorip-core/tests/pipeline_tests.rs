// autorip-core/tests/pipeline_tests.rs
//
// End-to-end runs of all three stages against scripted collaborators.

mod common;

use autorip_core::{Severity, Stage, StageOutcome, TitleStatus};
use common::{Harness, MockRenamer, MockRipper, track};

fn inception_harness(subtitles: bool) -> Harness {
    let mut h = Harness::new(|b| {
        let b = b.extras(true);
        if subtitles { b.subtitles("en") } else { b }
    });
    h.ripper = MockRipper::with_disc("INCEPTION", vec![track(0, 8887), track(1, 131)]);
    h.renamer = MockRenamer::renaming_to("Inception (2010).mkv");
    h
}

#[test]
fn test_full_pipeline_history() {
    let h = inception_harness(true);
    let summary = h.run(&Stage::ALL).unwrap();
    assert!(summary.skipped().is_empty());

    let title = h.only_title();
    assert_eq!(title.status, TitleStatus::Finalized);
    assert_eq!(title.name, "Inception (2010)");
    assert_eq!(title.output_file.as_deref(), Some("Inception (2010).mkv"));
    assert_eq!(title.source_path, h.movie_dir("Inception"));
    assert!(title.extras_enabled);

    assert_eq!(
        h.messages(&title),
        vec![
            "created",
            "submitted to ripper",
            "rip succeeded (0 min)",
            "compression started",
            "compression succeeded (0 min)",
            "submitted to renamer",
            "renamed to Inception (2010).mkv",
            "subtitles downloaded",
        ]
    );
    let history = h.ledger.history_for(title.id).unwrap();
    assert!(history.iter().all(|e| e.severity == Severity::Normal));

    // Raw rip removed, compressed and renamed artifact in place.
    let dir = h.movie_dir("Inception");
    assert!(!dir.join("title_t00.mkv").exists());
    assert!(dir.join("Inception (2010).mkv").exists());

    assert_eq!(h.ejector.ejected.borrow().as_slice(), ["/dev/sr0"]);
    assert_eq!(
        h.renamer.subtitle_calls.borrow().as_slice(),
        ["Inception (2010):en"]
    );
    assert_eq!(
        h.notifier.titles(),
        vec!["Rip Complete", "Compression Complete", "Title Finalized"]
    );
}

#[test]
fn test_subtitles_disabled_finalizes_directly() {
    let h = inception_harness(false);
    h.run(&Stage::ALL).unwrap();

    let title = h.only_title();
    assert_eq!(title.status, TitleStatus::Finalized);
    let messages = h.messages(&title);
    assert_eq!(messages.last().map(String::as_str), Some("finalized"));
    assert!(!messages.iter().any(|m| m.contains("subtitles")));
    assert!(h.renamer.subtitle_calls.borrow().is_empty());
}

#[test]
fn test_extras_disabled_stops_at_compressed() {
    let mut h = Harness::new(|b| b.extras(false));
    h.ripper = MockRipper::with_disc("HEAT", vec![track(0, 10_200)]);

    let summary = h.run(&Stage::ALL).unwrap();
    let title = h.only_title();
    assert_eq!(title.status, TitleStatus::Compressed);
    assert_eq!(title.output_file.as_deref(), Some("Heat.mkv"));
    assert!(h.renamer.rename_calls.borrow().is_empty());
    assert!(summary.report(Stage::Extras).unwrap().is_idle());
}

#[test]
fn test_rerun_is_idempotent() {
    let h = inception_harness(true);
    h.run(&Stage::ALL).unwrap();
    let title = h.only_title();
    let history_len = h.messages(&title).len();

    let summary = h.run(&Stage::ALL).unwrap();

    assert_eq!(h.only_title(), title);
    assert_eq!(h.messages(&title).len(), history_len);
    assert_eq!(h.ripper.extract_calls(), 1);
    assert_eq!(h.transcoder.call_count(), 1);
    assert_eq!(h.renamer.rename_calls.borrow().len(), 1);

    let rip = summary.report(Stage::Rip).unwrap();
    assert_eq!(rip.skipped, vec!["Inception"]);
    assert!(summary.report(Stage::Compress).unwrap().is_idle());
    assert!(summary.report(Stage::Extras).unwrap().is_idle());

    // The disc is still ejected on the skipped run.
    assert_eq!(h.ejector.ejected.borrow().len(), 2);
}

#[test]
fn test_stages_run_in_pipeline_order_once() {
    let h = inception_harness(false);
    let summary = h
        .run(&[Stage::Extras, Stage::Compress, Stage::Rip, Stage::Compress])
        .unwrap();

    let order: Vec<Stage> = summary.stages.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(order, Stage::ALL.to_vec());
    assert!(
        summary
            .stages
            .iter()
            .all(|(_, outcome)| matches!(outcome, StageOutcome::Completed(_)))
    );
    assert_eq!(h.only_title().status, TitleStatus::Finalized);
}

#[test]
fn test_single_stage_only_touches_its_work() {
    let h = inception_harness(false);
    h.run(&[Stage::Rip]).unwrap();
    assert_eq!(h.only_title().status, TitleStatus::Ripped);
    assert_eq!(h.transcoder.call_count(), 0);

    h.run(&[Stage::Extras]).unwrap();
    assert_eq!(h.only_title().status, TitleStatus::Ripped);

    h.run(&[Stage::Compress]).unwrap();
    assert_eq!(h.only_title().status, TitleStatus::Compressed);
}

// autorip-core/tests/compress_tests.rs

mod common;

use autorip_core::{Severity, Stage, TitleStatus};
use common::Harness;

#[test]
fn test_compress_replaces_raw_rip() {
    let h = Harness::new(|b| b.compress_format("mkv"));
    let title = h.ripped_title("Heat", "title_t00.mkv", false);

    let summary = h.run(&[Stage::Compress]).unwrap();

    let title = h.ledger.get_title(title.id).unwrap();
    assert_eq!(title.status, TitleStatus::Compressed);
    assert_eq!(title.output_file.as_deref(), Some("Heat.mkv"));
    assert!(h.movie_dir("Heat").join("Heat.mkv").is_file());
    assert!(!h.movie_dir("Heat").join("title_t00.mkv").exists());
    assert_eq!(summary.report(Stage::Compress).unwrap().succeeded, vec!["Heat"]);
    assert_eq!(h.notifier.titles(), vec!["Compression Complete"]);
}

#[test]
fn test_missing_input_returns_title_to_rip_failed() {
    let h = Harness::new(|b| b);
    let title = h.ripped_title("Heat", "title_t00.mkv", false);
    std::fs::remove_file(h.movie_dir("Heat").join("title_t00.mkv")).unwrap();

    h.run(&[Stage::Compress]).unwrap();

    let title = h.ledger.get_title(title.id).unwrap();
    assert_eq!(title.status, TitleStatus::RipFailed);
    let history = h.ledger.history_for(title.id).unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.message, "input file no longer exists");
    assert_eq!(last.severity, Severity::Failure);
    assert_eq!(h.transcoder.call_count(), 0);
}

#[test]
fn test_failure_stays_compressing_and_removes_partial_output() {
    let h = Harness::new(|b| b);
    let title = h.ripped_title("Heat", "title_t00.mkv", false);
    *h.transcoder.fail_with.borrow_mut() = Some("encoder crashed".into());
    *h.transcoder.leave_partial.borrow_mut() = true;

    let summary = h.run(&[Stage::Compress]).unwrap();

    let failed = h.ledger.get_title(title.id).unwrap();
    assert_eq!(failed.status, TitleStatus::Compressing);
    assert_eq!(failed.output_file.as_deref(), Some("title_t00.mkv"));
    assert_eq!(
        h.messages(&failed),
        vec![
            "created",
            "compression started",
            "compression failed: HandBrakeCLI: encoder crashed",
        ]
    );
    let history = h.ledger.history_for(failed.id).unwrap();
    assert_eq!(history.last().unwrap().severity, Severity::Failure);
    assert!(!h.movie_dir("Heat").join("Heat.mkv").exists());
    assert!(h.movie_dir("Heat").join("title_t00.mkv").is_file());
    assert_eq!(summary.report(Stage::Compress).unwrap().failed, vec!["Heat"]);
    assert_eq!(h.notifier.titles(), vec!["Compress Failed"]);

    // The next run claims the same title again and succeeds.
    *h.transcoder.fail_with.borrow_mut() = None;
    h.run(&[Stage::Compress]).unwrap();

    let title = h.ledger.get_title(title.id).unwrap();
    assert_eq!(title.status, TitleStatus::Compressed);
    assert_eq!(h.transcoder.call_count(), 2);
    assert!(!h.movie_dir("Heat").join("title_t00.mkv").exists());
}

#[test]
fn test_output_never_overwrites_input() {
    let h = Harness::new(|b| b.compress_format("mkv"));
    let title = h.ripped_title("Heat", "Heat.mkv", false);

    h.run(&[Stage::Compress]).unwrap();

    let title = h.ledger.get_title(title.id).unwrap();
    assert_eq!(title.output_file.as_deref(), Some("Heat.compressed.mkv"));
    let call = &h.transcoder.calls.borrow()[0];
    assert_eq!(call.input, h.movie_dir("Heat").join("Heat.mkv"));
    assert_eq!(call.output, h.movie_dir("Heat").join("Heat.compressed.mkv"));
}

#[test]
fn test_fresh_titles_are_preferred_over_retries() {
    let h = Harness::new(|b| b);
    let heat = h.ripped_title("Heat", "title_t00.mkv", false);
    *h.transcoder.fail_with.borrow_mut() = Some("encoder crashed".into());
    h.run(&[Stage::Compress]).unwrap();
    *h.transcoder.fail_with.borrow_mut() = None;

    let ronin = h.ripped_title("Ronin", "title_t01.mkv", false);
    h.run(&[Stage::Compress]).unwrap();

    assert_eq!(
        h.ledger.get_title(ronin.id).unwrap().status,
        TitleStatus::Compressed
    );
    assert_eq!(
        h.ledger.get_title(heat.id).unwrap().status,
        TitleStatus::Compressing
    );

    h.run(&[Stage::Compress]).unwrap();
    assert_eq!(
        h.ledger.get_title(heat.id).unwrap().status,
        TitleStatus::Compressed
    );
}

#[test]
fn test_one_title_per_run() {
    let h = Harness::new(|b| b);
    h.ripped_title("Heat", "title_t00.mkv", false);
    h.ripped_title("Ronin", "title_t00.mkv", false);

    h.run(&[Stage::Compress]).unwrap();

    assert_eq!(h.transcoder.call_count(), 1);
    assert_eq!(
        h.ledger.list_titles(Some(TitleStatus::Ripped)).unwrap().len(),
        1
    );
}

#[test]
fn test_arguments_and_niceness_are_passed_through() {
    let h = Harness::new(|b| {
        b.compress_format("mp4")
            .compress_args(vec!["--preset".into(), "Fast 1080p30".into()])
            .niceness(5)
    });
    h.ripped_title("Heat", "title_t00.mkv", false);

    h.run(&[Stage::Compress]).unwrap();

    let call = &h.transcoder.calls.borrow()[0];
    assert_eq!(call.args, vec!["--preset", "Fast 1080p30"]);
    assert_eq!(call.niceness, 5);
    assert_eq!(call.output.file_name().unwrap(), "Heat.mp4");
}

#[test]
fn test_empty_queue_is_idle() {
    let h = Harness::new(|b| b);
    let summary = h.run(&[Stage::Compress]).unwrap();
    assert!(summary.report(Stage::Compress).unwrap().is_idle());
}

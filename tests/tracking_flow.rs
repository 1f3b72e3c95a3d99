// tests/tracking_flow.rs
//
// Saved page → store → watchlist → report, through the public API only.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use zhihu_tracker::{
    analyzer,
    config::options::{AppOptions, SourceKind, StoreOptions},
    scrape::{self, Fetch, SnapshotScraper},
    store::QuestionStore,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/potential.html")
}

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 6).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

#[test]
fn snapshot_fetch_update_watch_report() {
    let dir = tempfile::tempdir().unwrap();
    let opts = StoreOptions::in_dir(dir.path());

    let mut scraper = SnapshotScraper::new(fixture());
    let first = scraper.fetch(None).unwrap();
    assert_eq!(first.len(), 3);

    let mut store = QuestionStore::open(opts.clone()).unwrap();
    let changes = store.update_questions_at(first.clone(), t0()).unwrap();
    assert_eq!(changes.new.len(), 3);
    assert!(changes.updated.is_empty());

    // an hour later the first question gained 5000 views
    let mut second = first.clone();
    second[0].view_total += 5000;
    let changes = store.update_questions_at(second, t0() + Duration::hours(1)).unwrap();
    assert_eq!(changes.updated.len(), 1);
    assert_eq!(changes.updated[0].view_increment, 5000);
    assert_eq!(changes.updated[0].answer_increment, 0);

    let url = first[2].question_url.clone();
    assert!(store.add_to_watched(&url).unwrap());
    assert_eq!(store.question_list()[0].url(), url);

    // everything survives a reopen
    drop(store);
    let store = QuestionStore::open(opts).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.history(&first[0].question_url).len(), 2);
    assert!(store.is_watched(&url));

    let report = analyzer::report(&store, 5);
    assert!(report.starts_with("Questions tracked: 3 (6 snapshots)"), "{report}");
    assert!(report.contains("+5000 views/h"), "{report}");
}

#[test]
fn file_source_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("tracker.toml");
    std::fs::write(
        &cfg,
        format!(
            "[scraper]\nsource = \"file\"\nsnapshot_path = {:?}\n\n[store]\nmax_history = 2\n",
            fixture().display().to_string()
        ),
    )
    .unwrap();

    let opts = AppOptions::load(&cfg).unwrap();
    assert_eq!(opts.scraper.source, SourceKind::File);
    assert_eq!(opts.store.max_history, 2);

    let mut fetcher = scrape::scraper_from_options(&opts.scraper).unwrap();
    let questions = fetcher.fetch(None).unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[2].view_total, 329_000);
    fetcher.close();
}

#[test]
fn missing_config_is_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let opts = AppOptions::load(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(opts, AppOptions::default());
}

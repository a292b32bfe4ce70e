//! Stop points and failure semantics of the batch executor, against a real
//! directory tree.

use std::cell::Cell;
use std::convert::Infallible;
use std::fs;
use std::path::Path;

use preview_migrate::migrate::{
    ExitOutcome, FileId, MemoryGuard, MigrationBatch, MigrationExecutor, MigrationMode, NullProgress,
    PreviewLayout, PreviewRecord, ProgressSink, ResourceGuard, group_records,
};
use preview_migrate::{FsObjectStore, MigrateError, NeverCancel, ObjectStore, ShutdownSignal, StorePath};
use tempfile::tempdir;

fn seed(root: &Path, stored: &[&str]) -> Vec<PreviewRecord> {
    let layout = PreviewLayout::default();
    stored
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let path = StorePath::parse(s).unwrap();
            let legacy = layout.legacy_source(&path).unwrap().to_fs_path(root);
            fs::create_dir_all(legacy.parent().unwrap()).unwrap();
            fs::write(&legacy, s.as_bytes()).unwrap();
            PreviewRecord::new(FileId(i as u64 + 1), path, FileId(0)).unwrap()
        })
        .collect()
}

fn batches(records: Vec<PreviewRecord>) -> impl Iterator<Item = Result<MigrationBatch, Infallible>> {
    group_records(records).map(Ok)
}

#[derive(Default)]
struct Recorder {
    started: Vec<String>,
    statuses: Vec<String>,
    advances: u32,
    finished: Option<ExitOutcome>,
}

impl ProgressSink for Recorder {
    fn batch_started(&mut self, batch: &MigrationBatch) {
        self.started.push(batch.destination_parent.to_string());
    }
    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }
    fn advance(&mut self) {
        self.advances += 1;
    }
    fn finish(&mut self, outcome: ExitOutcome) {
        self.finished = Some(outcome);
    }
}

/// Allows the first `allowed` batch boundaries, then reports no headroom.
struct ScriptedGuard {
    allowed: u32,
    calls: Cell<u32>,
}

impl ScriptedGuard {
    fn new(allowed: u32) -> Self {
        Self { allowed, calls: Cell::new(0) }
    }
}

impl ResourceGuard for ScriptedGuard {
    fn has_headroom(&self) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.calls.get() <= self.allowed
    }
    fn memory_usage(&self) -> Option<u64> {
        Some(1)
    }
}

/// Filesystem store that can raise the shutdown signal mid-batch and lie about emptiness.
struct Instrumented<'a> {
    inner: FsObjectStore,
    signal: &'a ShutdownSignal,
    cancel_on_move: usize,
    moves: Cell<usize>,
    claim_empty: bool,
}

impl<'a> Instrumented<'a> {
    fn new(root: &Path, signal: &'a ShutdownSignal) -> Self {
        Self {
            inner: FsObjectStore::new(root),
            signal,
            cancel_on_move: usize::MAX,
            moves: Cell::new(0),
            claim_empty: false,
        }
    }
}

impl ObjectStore for Instrumented<'_> {
    fn stat_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        self.inner.stat_dir(path)
    }
    fn create_dir_all(&self, path: &StorePath) -> Result<(), MigrateError> {
        self.inner.create_dir_all(path)
    }
    fn move_object(&self, from: &StorePath, to: &StorePath) -> Result<(), MigrateError> {
        self.moves.set(self.moves.get() + 1);
        if self.moves.get() == self.cancel_on_move {
            self.signal.request();
        }
        self.inner.move_object(from, to)
    }
    fn delete_object(&self, path: &StorePath) -> Result<(), MigrateError> {
        self.inner.delete_object(path)
    }
    fn is_empty_dir(&self, path: &StorePath) -> Result<bool, MigrateError> {
        if self.claim_empty {
            return Ok(true);
        }
        self.inner.is_empty_dir(path)
    }
    fn remove_empty_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        self.inner.remove_empty_dir(path)
    }
    fn exists(&self, path: &StorePath) -> Result<bool, MigrateError> {
        self.inner.exists(path)
    }
}

const TWO_GROUPS: [&str; 5] = [
    "preview/11/a.png",
    "preview/11/b.png",
    "preview/11/c.png",
    "preview/12/d.png",
    "preview/12/e.png",
];

#[test]
fn cancel_inside_batch_completes_and_reclaims_it() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &TWO_GROUPS);
    let layout = PreviewLayout::default();
    let signal = ShutdownSignal::new();
    let mut store = Instrumented::new(root, &signal);
    store.cancel_on_move = 2;
    let mut progress = Recorder::default();

    let report = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &MemoryGuard::unlimited(), &signal, &mut progress)
        .unwrap();

    assert_eq!(report.outcome, ExitOutcome::CancelledCleanly);
    assert_eq!(report.outcome.exit_code(), 0);
    assert_eq!(report.stats.batches, 1);
    assert_eq!(report.stats.objects_moved, 3);
    for name in ["a", "b", "c"] {
        assert!(root.join(format!("preview/11/{name}.png")).is_file());
    }
    assert!(!root.join("preview/old-multibucket/11").exists(), "batch 1 reclaimed");
    assert!(root.join("preview/old-multibucket/12/d.png").is_file(), "batch 2 never started");
    assert!(!root.join("preview/12").exists());
    assert_eq!(progress.started, vec!["preview/11"]);
    assert_eq!(progress.advances, 1);
    assert_eq!(progress.finished, Some(ExitOutcome::CancelledCleanly));
}

#[test]
fn guard_stops_before_batch_k() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &["preview/1/a.png", "preview/2/b.png", "preview/3/c.png"]);
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);
    let guard = ScriptedGuard::new(2);

    let report = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &guard, &NeverCancel, &mut NullProgress)
        .unwrap();

    assert_eq!(report.outcome, ExitOutcome::AbortedOnResource);
    assert_eq!(report.outcome.exit_code(), 1);
    assert_eq!(report.stats.batches, 2);
    assert!(root.join("preview/1/a.png").is_file());
    assert!(root.join("preview/2/b.png").is_file());
    assert!(root.join("preview/old-multibucket/3/c.png").is_file());
    assert!(!root.join("preview/3").exists());
}

#[test]
fn no_headroom_at_start_touches_nothing() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &["preview/1/a.png"]);
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);
    let mut progress = Recorder::default();

    let report = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &ScriptedGuard::new(0), &NeverCancel, &mut progress)
        .unwrap();

    assert_eq!(report.outcome, ExitOutcome::AbortedOnResource);
    assert_eq!(report.stats.batches, 0);
    assert!(progress.started.is_empty());
    assert!(root.join("preview/old-multibucket/1/a.png").is_file());
}

#[test]
fn cancel_before_start_touches_nothing() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &["preview/1/a.png"]);
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);
    let signal = ShutdownSignal::new();
    signal.request();

    let report = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &MemoryGuard::unlimited(), &signal, &mut NullProgress)
        .unwrap();
    assert_eq!(report.outcome, ExitOutcome::CancelledCleanly);
    assert!(root.join("preview/old-multibucket/1/a.png").is_file());
}

#[test]
fn move_failure_is_fatal_and_leaves_batch_partial() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &TWO_GROUPS);
    // Occupy the destination of the second record.
    fs::create_dir_all(root.join("preview/11")).unwrap();
    fs::write(root.join("preview/11/b.png"), b"already here").unwrap();

    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);
    let mut progress = Recorder::default();
    let err = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &MemoryGuard::unlimited(), &NeverCancel, &mut progress)
        .unwrap_err();

    match err.downcast_ref::<MigrateError>() {
        Some(MigrateError::AlreadyExists(p)) => assert_eq!(p.as_str(), "preview/11/b.png"),
        other => panic!("unexpected error: {other:?} ({err:#})"),
    }
    assert!(root.join("preview/11/a.png").is_file(), "first record stays migrated");
    assert!(root.join("preview/old-multibucket/11/b.png").is_file());
    assert!(root.join("preview/old-multibucket/11/c.png").is_file());
    assert_eq!(fs::read(root.join("preview/11/b.png")).unwrap(), b"already here");
    assert!(root.join("preview/old-multibucket/12/d.png").is_file());
    assert_eq!(progress.advances, 0);
    assert_eq!(progress.finished, None);
}

#[test]
fn removing_a_non_empty_folder_is_fatal() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &["preview/5/a.png"]);
    fs::write(root.join("preview/old-multibucket/5/stray.tmp"), b"x").unwrap();

    let layout = PreviewLayout::default();
    let signal = ShutdownSignal::new();
    let mut store = Instrumented::new(root, &signal);
    store.claim_empty = true;

    let err = MigrationExecutor::new(&store, &layout)
        .run(batches(records), &MemoryGuard::unlimited(), &NeverCancel, &mut NullProgress)
        .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<MigrateError>(), Some(MigrateError::DirectoryNotEmpty(_))),
        "{err:#}"
    );
    assert!(root.join("preview/old-multibucket/5/stray.tmp").is_file());
}

#[test]
fn scan_failure_stops_the_run() {
    let td = tempdir().unwrap();
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(td.path());
    let input: Vec<Result<MigrationBatch, MigrateError>> = vec![Err(MigrateError::InvalidPath {
        path: "x".into(),
        reason: "broken export",
    })];
    let err = MigrationExecutor::new(&store, &layout)
        .run(input, &MemoryGuard::unlimited(), &NeverCancel, &mut NullProgress)
        .unwrap_err();
    assert!(format!("{err:#}").contains("broken export"));
}

#[test]
fn delete_mode_removes_legacy_objects_and_reclaims() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &TWO_GROUPS);
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);

    let report = MigrationExecutor::new(&store, &layout)
        .with_mode(MigrationMode::Delete)
        .run(batches(records), &MemoryGuard::unlimited(), &NeverCancel, &mut NullProgress)
        .unwrap();

    assert_eq!(report.outcome, ExitOutcome::Completed);
    assert_eq!(report.stats.objects_deleted, 5);
    assert_eq!(report.stats.objects_moved, 0);
    assert!(!root.join("preview/old-multibucket").exists());
    assert!(!root.join("preview/11").exists());
    assert!(root.join("preview").is_dir(), "reclaim stops at the legacy root");
}

#[test]
fn dry_run_changes_nothing_but_reports_every_step() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = seed(root, &TWO_GROUPS);
    let layout = PreviewLayout::default();
    let store = FsObjectStore::new(root);
    let mut progress = Recorder::default();

    let report = MigrationExecutor::new(&store, &layout)
        .with_dry_run(true)
        .run(batches(records), &MemoryGuard::unlimited(), &NeverCancel, &mut progress)
        .unwrap();

    assert_eq!(report.outcome, ExitOutcome::Completed);
    assert_eq!(report.stats.batches, 2);
    assert_eq!(report.stats.objects_moved, 0);
    assert_eq!(progress.advances, 2);
    assert!(progress
        .statuses
        .contains(&"Moving preview/old-multibucket/11/a.png to preview/11/a.png".to_string()));
    assert!(progress
        .statuses
        .iter()
        .any(|s| s.starts_with("Deleting empty parent folders of preview/old-multibucket/12")));
    for s in TWO_GROUPS {
        let legacy = layout.legacy_source(&StorePath::parse(s).unwrap()).unwrap();
        assert!(legacy.to_fs_path(root).is_file());
    }
    assert!(!root.join("preview/11").exists());
}

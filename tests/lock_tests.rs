use fs2::FileExt;
use std::fs::OpenOptions;

use preview_migrate::MigrateError;
use preview_migrate::migrate::RunLock;

#[test]
fn lock_uncontended_then_released_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let lock = RunLock::acquire(dir.path()).unwrap();
    let lock_file = lock.path().to_path_buf();
    assert!(lock_file.starts_with(dir.path()));
    drop(lock);
    assert!(lock_file.exists(), "lock file stays in place after release");

    let again = RunLock::acquire(dir.path()).unwrap();
    drop(again);
}

#[test]
fn contended_lock_reports_already_running() {
    let dir = tempfile::tempdir().unwrap();
    let first = RunLock::acquire(dir.path()).unwrap();
    match RunLock::acquire(dir.path()) {
        Err(MigrateError::AlreadyRunning(path)) => assert_eq!(path, first.path()),
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }
    drop(first);
    assert!(RunLock::acquire(dir.path()).is_ok());
}

// A process that opened the lock file while it was held must contend with
// whoever acquires next, not lock a private, unlinked copy.
#[test]
fn waiter_that_opened_early_still_excludes_next_holder() {
    let dir = tempfile::tempdir().unwrap();
    let first = RunLock::acquire(dir.path()).unwrap();
    let waiter = OpenOptions::new()
        .read(true)
        .write(true)
        .open(first.path())
        .unwrap();
    drop(first);

    let next = RunLock::acquire(dir.path()).unwrap();
    assert!(
        waiter.try_lock_exclusive().is_err(),
        "early opener must see the lock taken by the next holder"
    );
    drop(next);
    waiter.try_lock_exclusive().unwrap();
    match RunLock::acquire(dir.path()) {
        Err(MigrateError::AlreadyRunning(_)) => {}
        other => panic!("expected AlreadyRunning while the waiter holds it, got {other:?}"),
    }
    FileExt::unlock(&waiter).unwrap();
}

#[test]
fn locks_on_different_roots_are_independent() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let _la = RunLock::acquire(a.path()).unwrap();
    let _lb = RunLock::acquire(b.path()).unwrap();
}

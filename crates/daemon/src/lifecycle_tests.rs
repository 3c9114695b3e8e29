// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn lock_records_the_current_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zsnapd.pid");

    let lock = PidLock::acquire(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());
    lock.release();
    assert!(!path.exists());
}

#[test]
fn second_acquire_fails_while_lock_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zsnapd.pid");

    let lock = PidLock::acquire(&path).unwrap();
    let err = PidLock::acquire(&path).unwrap_err();
    assert!(matches!(err, LifecycleError::LockFailed { .. }));

    drop(lock);
    PidLock::acquire(&path).unwrap();
}

#[test]
fn acquire_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run").join("zsnapd.pid");

    PidLock::acquire(&path).unwrap();
    assert!(path.exists());
}

mod common;

use aiolaunch::detect;
use common::FakeEngine;
use tempfile::TempDir;

const CONTAINER: &str = "nextcloud-aio-mastercontainer";
const PREFIX: &str = "nextcloud_aio_";

#[test]
fn clean_host_detects_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("never-created");
    let engine = FakeEngine::new();

    let state = detect::scan(&engine, &missing, CONTAINER, PREFIX);

    assert!(!state.detected());
    assert!(!state.dir_present);
    assert_eq!(state.container_count(), 0);
    assert_eq!(state.volume_count(), 0);
}

#[test]
fn counts_matching_resources() {
    let dir = TempDir::new().expect("tempdir");
    let engine = FakeEngine::new()
        .with_container("nextcloud-aio-mastercontainer")
        .with_container("unrelated-app")
        .with_volume("nextcloud_aio_mastercontainer", &[])
        .with_volume("nextcloud_aio_database", &[])
        .with_volume("other_volume", &[]);

    let state = detect::scan(&engine, dir.path(), CONTAINER, PREFIX);

    assert!(state.detected());
    assert!(state.dir_present);
    assert_eq!(state.container_count(), 1);
    assert_eq!(state.volume_count(), 2);
}

#[test]
fn unreachable_engine_proves_nothing() {
    // Detector must not error when the daemon is down; the real
    // failure belongs to the validator stage.
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("never-created");
    let engine = FakeEngine {
        unreachable: true,
        ..FakeEngine::new()
    };

    let state = detect::scan(&engine, &missing, CONTAINER, PREFIX);

    assert!(!state.detected());
    assert_eq!(state.container_count(), 0);
    assert_eq!(state.volume_count(), 0);
}

#[test]
fn directory_alone_counts_as_detected() {
    let dir = TempDir::new().expect("tempdir");
    let engine = FakeEngine {
        unreachable: true,
        ..FakeEngine::new()
    };

    let state = detect::scan(&engine, dir.path(), CONTAINER, PREFIX);

    assert!(state.detected());
    assert!(state.dir_present);
}

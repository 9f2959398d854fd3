mod common;

use std::fs;

use aiolaunch::config::DeployConfig;
use aiolaunch::{backup, restore};
use common::FakeEngine;
use tempfile::TempDir;

fn test_cfg(work: &TempDir, backups: &TempDir) -> DeployConfig {
    DeployConfig::new("example.com")
        .work_dir(work.path())
        .backup_root(backups.path())
}

fn seed_work_dir(work: &TempDir) {
    fs::write(work.path().join("docker-compose.yml"), b"services: {}\n").expect("seed compose");
}

#[test]
fn backup_then_restore_reproduces_volume_contents() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    seed_work_dir(&work);
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new()
        .with_volume(
            "nextcloud_aio_mastercontainer",
            &[("configuration.json", b"{\"domain\":\"x\"}"), ("id", b"42")],
        )
        .with_volume("nextcloud_aio_database", &[("dump.sql", b"CREATE TABLE t;")]);

    let original_master = engine.volume_contents("nextcloud_aio_mastercontainer").unwrap();
    let original_db = engine.volume_contents("nextcloud_aio_database").unwrap();

    let report = backup::run(&engine, &cfg).expect("backup");
    assert!(report.valid);
    assert_eq!(report.volume_count(), 2);
    assert!(report.volumes_skipped.is_empty());
    assert!(report.total_bytes > 0);

    // Wreck the live state, then restore from the archive.
    engine.volumes.borrow_mut().clear();
    restore::run(&engine, &cfg, &report.archive_dir).expect("restore");

    assert_eq!(
        engine.volume_contents("nextcloud_aio_mastercontainer").unwrap(),
        original_master
    );
    assert_eq!(
        engine.volume_contents("nextcloud_aio_database").unwrap(),
        original_db
    );
    // Config snapshot came back too.
    assert_eq!(
        fs::read(work.path().join("docker-compose.yml")).expect("read"),
        b"services: {}\n"
    );
    assert_eq!(engine.op_count("compose up"), 1);
}

#[test]
fn zero_volumes_archive_is_flagged_invalid() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    seed_work_dir(&work);
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new();
    let report = backup::run(&engine, &cfg).expect("backup");

    assert_eq!(report.volume_count(), 0);
    assert!(!report.valid);
    // Still a complete archive otherwise: restore script and config.
    assert!(report.archive_dir.join("restore.sh").is_file());
    assert!(report.archive_dir.join("config/docker-compose.yml").is_file());
    assert!(report.archive_dir.join("MANIFEST.txt").is_file());
}

#[test]
fn single_volume_failure_is_skipped_not_fatal() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new()
        .with_volume("nextcloud_aio_mastercontainer", &[("f", b"data")])
        .with_volume("nextcloud_aio_database", &[("dump.sql", b"sql")])
        .failing_export("nextcloud_aio_database");

    let report = backup::run(&engine, &cfg).expect("backup");

    assert_eq!(report.volumes_archived, vec!["nextcloud_aio_mastercontainer"]);
    assert_eq!(report.volumes_skipped, vec!["nextcloud_aio_database"]);
    // N-1 = 1 tarball remains, so the archive is still valid.
    assert!(report.valid);
    assert!(report
        .archive_dir
        .join("volumes/nextcloud_aio_mastercontainer.tar.gz")
        .is_file());
    assert!(!report
        .archive_dir
        .join("volumes/nextcloud_aio_database.tar.gz")
        .exists());
}

#[test]
fn all_volumes_failing_marks_archive_invalid() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new()
        .with_volume("nextcloud_aio_mastercontainer", &[("f", b"data")])
        .failing_export("nextcloud_aio_mastercontainer");

    let report = backup::run(&engine, &cfg).expect("backup");

    assert_eq!(report.volume_count(), 0);
    assert_eq!(report.volumes_skipped.len(), 1);
    assert!(!report.valid);
}

#[test]
fn mastercontainer_scenario_archive_layout() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    seed_work_dir(&work);
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new().with_volume(
        "nextcloud_aio_mastercontainer",
        &[("configuration.json", b"{}")],
    );

    let report = backup::run(&engine, &cfg).expect("backup");

    let tarball = report
        .archive_dir
        .join("volumes/nextcloud_aio_mastercontainer.tar.gz");
    assert!(tarball.is_file());
    assert!(report.archive_dir.join("config/docker-compose.yml").is_file());

    let script_path = report.archive_dir.join("restore.sh");
    assert!(script_path.is_file());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&script_path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "restore.sh must be executable");
    }

    // Restoring against a clean host recreates the volume with the
    // tarball's contents.
    engine.volumes.borrow_mut().clear();
    fs::remove_dir_all(work.path()).expect("clean host");
    restore::run(&engine, &cfg, &report.archive_dir).expect("restore");

    let restored = engine
        .volume_contents("nextcloud_aio_mastercontainer")
        .expect("volume recreated");
    assert_eq!(restored.get("configuration.json").map(Vec::as_slice), Some(&b"{}"[..]));
}

#[test]
fn restore_twice_converges_on_same_state() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    seed_work_dir(&work);
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new().with_volume(
        "nextcloud_aio_mastercontainer",
        &[("configuration.json", b"original")],
    );

    let report = backup::run(&engine, &cfg).expect("backup");

    restore::run(&engine, &cfg, &report.archive_dir).expect("first restore");
    let after_first = engine.volume_contents("nextcloud_aio_mastercontainer").unwrap();

    // Drift the live state between runs.
    engine
        .volumes
        .borrow_mut()
        .get_mut("nextcloud_aio_mastercontainer")
        .unwrap()
        .insert("configuration.json".to_string(), b"tampered".to_vec());

    restore::run(&engine, &cfg, &report.archive_dir).expect("second restore");
    let after_second = engine.volume_contents("nextcloud_aio_mastercontainer").unwrap();

    assert_eq!(after_first, after_second);
    // Each run redoes the destructive steps: fresh volume both times.
    assert_eq!(engine.op_count("volume rm nextcloud_aio_mastercontainer"), 2);
    assert_eq!(engine.op_count("compose up"), 2);
}

#[test]
fn restore_missing_archive_is_an_error() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    let cfg = test_cfg(&work, &backups);
    let engine = FakeEngine::new();

    let missing = backups.path().join("no-such-archive");
    let err = restore::run(&engine, &cfg, &missing).expect_err("must fail");
    assert!(err.to_string().contains("backup archive not found"));
    // Nothing was touched.
    assert!(engine.ops.borrow().is_empty());
}

#[test]
fn container_snapshot_is_taken_when_containers_exist() {
    let work = TempDir::new().expect("tempdir");
    let backups = TempDir::new().expect("tempdir");
    let cfg = test_cfg(&work, &backups);

    let engine = FakeEngine::new()
        .with_volume("nextcloud_aio_mastercontainer", &[("f", b"x")])
        .with_container("nextcloud-aio-mastercontainer");

    let report = backup::run(&engine, &cfg).expect("backup");

    let snapshot = fs::read_to_string(report.archive_dir.join("containers.json")).expect("read");
    assert!(snapshot.contains("nextcloud-aio-mastercontainer"));
}

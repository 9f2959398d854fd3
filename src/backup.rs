use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::DeployConfig;
use crate::engine::ContainerEngine;
use crate::error::DeployResult;
use crate::restore;

/// Outcome of one backup run, for the operator summary.
///
/// `valid` is advisory: the workflow proceeds to the reset stage
/// either way, only the displayed message changes.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub archive_dir: PathBuf,
    pub volumes_archived: Vec<String>,
    pub volumes_skipped: Vec<String>,
    pub total_bytes: u64,
    pub valid: bool,
}

impl BackupReport {
    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.volumes_archived.len()
    }
}

/// Archive the current deployment into a timestamped directory
/// under the backup root:
///
/// ```text
/// <root>/aio-backup-<timestamp>/
///   volumes/<name>.tar.gz   one per named volume
///   config/                 verbatim copy of the work dir
///   containers.json         inspect snapshot, best-effort
///   restore.sh              standalone restore script, mode 0755
///   MANIFEST.txt            size / volume count summary
/// ```
///
/// A single volume's failure is logged and skipped; it never aborts
/// the remaining volumes.
pub fn run(engine: &dyn ContainerEngine, cfg: &DeployConfig) -> DeployResult<BackupReport> {
    let archive_dir = allocate_archive_dir(&cfg.backup_root)?;
    let volumes_dir = archive_dir.join("volumes");
    fs::create_dir_all(&volumes_dir)?;

    eprintln!("Backing up to {}...", archive_dir.display());

    let volumes = engine.list_volumes(&cfg.volume_prefix).unwrap_or_default();
    let mut archived = Vec::new();
    let mut skipped = Vec::new();

    for volume in &volumes {
        let dest = volumes_dir.join(format!("{volume}.tar.gz"));
        eprintln!("  Archiving volume {volume}...");
        match engine.export_volume(volume, &dest) {
            Ok(()) => archived.push(volume.clone()),
            Err(e) => {
                log::warn!("backup of volume {volume} failed, skipping: {e}");
                // Don't leave a partial tarball behind
                let _ = fs::remove_file(&dest);
                skipped.push(volume.clone());
            }
        }
    }

    snapshot_config(cfg, &archive_dir);
    snapshot_containers(engine, cfg, &archive_dir);

    let script = restore::render_script(cfg, &archived);
    write_executable(&archive_dir.join("restore.sh"), &script)?;

    let total_bytes = dir_size(&archive_dir);
    let valid = validate(&archive_dir);
    write_manifest(&archive_dir, &archived, &skipped, total_bytes, valid)?;

    Ok(BackupReport {
        archive_dir,
        volumes_archived: archived,
        volumes_skipped: skipped,
        total_bytes,
        valid,
    })
}

/// An archive is valid iff the restore script exists and at least
/// one volume tarball was produced.
#[must_use]
pub fn validate(archive_dir: &Path) -> bool {
    if !archive_dir.join("restore.sh").is_file() {
        return false;
    }
    tarballs_in(&archive_dir.join("volumes")).is_ok_and(|t| !t.is_empty())
}

/// Volume tarballs present in an archive's `volumes/` directory,
/// sorted by name.
pub fn tarballs_in(volumes_dir: &Path) -> DeployResult<Vec<PathBuf>> {
    let mut tarballs = Vec::new();
    if !volumes_dir.is_dir() {
        return Ok(tarballs);
    }
    for entry in fs::read_dir(volumes_dir)? {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".tar.gz"))
        {
            tarballs.push(path);
        }
    }
    tarballs.sort();
    Ok(tarballs)
}

fn allocate_archive_dir(root: &Path) -> DeployResult<PathBuf> {
    let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
    let base = root.join(format!("aio-backup-{timestamp}"));

    let mut candidate = base.clone();
    let mut n = 1;
    while candidate.exists() {
        n += 1;
        candidate = PathBuf::from(format!("{}-{n}", base.display()));
    }
    fs::create_dir_all(&candidate)?;
    Ok(candidate)
}

fn snapshot_config(cfg: &DeployConfig, archive_dir: &Path) {
    if !cfg.work_dir.is_dir() {
        log::debug!("work dir {} absent, skipping config snapshot", cfg.work_dir.display());
        return;
    }
    let dest = archive_dir.join("config");
    if let Err(e) = copy_dir_all(&cfg.work_dir, &dest) {
        log::warn!("config snapshot failed: {e}");
    }
}

fn snapshot_containers(engine: &dyn ContainerEngine, cfg: &DeployConfig, archive_dir: &Path) {
    let containers = match engine.list_containers(&cfg.container_name) {
        Ok(c) if !c.is_empty() => c,
        Ok(_) => return,
        Err(e) => {
            log::warn!("container listing for snapshot failed: {e}");
            return;
        }
    };

    match engine.inspect_containers(&containers) {
        Ok(json) => {
            if let Err(e) = fs::write(archive_dir.join("containers.json"), json) {
                log::warn!("writing container snapshot failed: {e}");
            }
        }
        Err(e) => log::warn!("container inspect for snapshot failed: {e}"),
    }
}

fn write_manifest(
    archive_dir: &Path,
    archived: &[String],
    skipped: &[String],
    total_bytes: u64,
    valid: bool,
) -> DeployResult<()> {
    let mut manifest = String::new();
    manifest.push_str(&format!("created: {}\n", Local::now().to_rfc3339()));
    manifest.push_str(&format!("volumes: {}\n", archived.len()));
    manifest.push_str(&format!("skipped: {}\n", skipped.len()));
    manifest.push_str(&format!("size_bytes: {total_bytes}\n"));
    manifest.push_str(&format!("valid: {valid}\n"));
    for volume in archived {
        manifest.push_str(&format!("volume: {volume}\n"));
    }
    fs::write(archive_dir.join("MANIFEST.txt"), manifest)?;
    Ok(())
}

fn write_executable(path: &Path, content: &str) -> DeployResult<()> {
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Recursive copy preserving the directory shape. Symlinks are
/// followed, matching what `cp -r` of the work dir does in practice.
pub fn copy_dir_all(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map_or(0, |m| m.len())
            }
        })
        .sum()
}

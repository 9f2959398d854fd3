use std::fs;
use std::path::Path;

use crate::backup;
use crate::config::DeployConfig;
use crate::engine::ContainerEngine;
use crate::error::{DeployError, DeployResult};

/// Render the standalone `restore.sh` placed inside every archive.
///
/// The script must work on a host where this tool was never
/// installed, so it carries the conventional paths and the archived
/// volume list inline and locates the archive relative to itself.
/// Pure: identical inputs produce byte-identical scripts.
#[must_use]
pub fn render_script(cfg: &DeployConfig, volumes: &[String]) -> String {
    let work_dir = cfg.work_dir.display();
    let volume_prefix = &cfg.volume_prefix;
    let volume_list = volumes.join(" ");

    format!(
        r#"#!/usr/bin/env bash
# Restore a Nextcloud AIO backup taken by aiolaunch.
# Self-contained: run from anywhere, needs only docker.
set -u

ARCHIVE_DIR="$(cd "$(dirname "$0")" && pwd)"
WORK_DIR="{work_dir}"
VOLUME_PREFIX="{volume_prefix}"
VOLUMES="{volume_list}"

if [ "$(id -u)" -ne 0 ]; then
    echo "This restore must run as root." >&2
    exit 1
fi

echo "This will OVERWRITE the Nextcloud AIO installation at $WORK_DIR"
echo "and replace every volume named $VOLUME_PREFIX*."
read -r -p "Type 'yes' to continue: " answer
if [ "$answer" != "yes" ]; then
    echo "Aborted."
    exit 0
fi

# Bring down whatever is currently running (tolerate absence)
if [ -f "$WORK_DIR/docker-compose.yml" ]; then
    docker compose --project-directory "$WORK_DIR" down || true
fi

# Remove current volumes matching the naming convention
for vol in $(docker volume ls --format '{{{{.Name}}}}' | grep "^$VOLUME_PREFIX" || true); do
    docker volume rm "$vol" || true
done

# Recreate the working directory from the archived config
rm -rf "$WORK_DIR"
mkdir -p "$WORK_DIR"
if [ -d "$ARCHIVE_DIR/config" ]; then
    cp -a "$ARCHIVE_DIR/config/." "$WORK_DIR/"
fi

# Recreate and fill each volume from its tarball
for vol in $VOLUMES; do
    tarball="$ARCHIVE_DIR/volumes/$vol.tar.gz"
    if [ ! -f "$tarball" ]; then
        echo "WARNING: $tarball missing, skipping $vol" >&2
        continue
    fi
    docker volume create "$vol"
    docker run --rm -v "$vol:/data" -v "$ARCHIVE_DIR/volumes:/backup:ro" \
        alpine sh -c "tar xzf /backup/$vol.tar.gz -C /data"
done

# Bring the deployment back up
docker compose --project-directory "$WORK_DIR" up -d

echo "Restore complete."
"#
    )
}

/// Replay an archive against the host through the engine seam.
///
/// Destructive and deliberately not re-entrant: running it twice
/// redoes every step, but both runs converge on the same end state
/// since volumes are recreated fresh each time. Confirmation is the
/// CLI layer's job; this function never prompts.
pub fn run(
    engine: &dyn ContainerEngine,
    cfg: &DeployConfig,
    archive_dir: &Path,
) -> DeployResult<()> {
    if !archive_dir.is_dir() {
        return Err(DeployError::ArchiveNotFound(
            archive_dir.display().to_string(),
        ));
    }

    eprintln!("Restoring from {}...", archive_dir.display());

    // Bring down whatever is currently running (tolerate absence)
    if cfg.compose_path().is_file() {
        if let Err(e) = engine.compose_down(&cfg.work_dir) {
            log::warn!("compose down failed (continuing): {e}");
        }
    }

    // Drop current volumes matching the naming convention
    let current = engine.list_volumes(&cfg.volume_prefix).unwrap_or_default();
    for volume in &current {
        if let Err(e) = engine.remove_volume(volume) {
            log::warn!("removing volume {volume} failed (continuing): {e}");
        }
    }

    // Recreate the working directory from the archived config
    if cfg.work_dir.exists() {
        fs::remove_dir_all(&cfg.work_dir)?;
    }
    fs::create_dir_all(&cfg.work_dir)?;
    let config_snapshot = archive_dir.join("config");
    if config_snapshot.is_dir() {
        backup::copy_dir_all(&config_snapshot, &cfg.work_dir)?;
    }

    // Recreate and fill each volume from its tarball
    for tarball in backup::tarballs_in(&archive_dir.join("volumes"))? {
        let Some(volume) = volume_name(&tarball) else {
            continue;
        };
        eprintln!("  Restoring volume {volume}...");
        engine.create_volume(&volume)?;
        if let Err(e) = engine.import_volume(&volume, &tarball) {
            log::warn!("restore of volume {volume} failed, skipping: {e}");
        }
    }

    // Bring-up failure is surfaced, not swallowed: at this point
    // the operator has to intervene either way.
    engine.compose_up(&cfg.work_dir)?;

    eprintln!("Restore complete.");
    Ok(())
}

fn volume_name(tarball: &Path) -> Option<String> {
    tarball
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".tar.gz"))
        .map(ToString::to_string)
}

use std::fs;

use crate::config::DeployConfig;
use crate::engine::ContainerEngine;
use crate::error::DeployResult;

/// Tear down the existing deployment: compose down, remove matching
/// containers and volumes, delete the work dir.
///
/// Destructive and immediate. No rollback exists; the only recovery
/// path is a backup taken beforehand.
pub fn run(engine: &dyn ContainerEngine, cfg: &DeployConfig) -> DeployResult<()> {
    eprintln!("Removing existing installation...");

    if cfg.compose_path().is_file() {
        if let Err(e) = engine.compose_down(&cfg.work_dir) {
            log::warn!("compose down failed (continuing): {e}");
        }
    }

    let containers = engine.list_containers(&cfg.container_name).unwrap_or_default();
    for container in &containers {
        if let Err(e) = engine.remove_container(container) {
            log::warn!("removing container {container} failed (continuing): {e}");
        }
    }

    let volumes = engine.list_volumes(&cfg.volume_prefix).unwrap_or_default();
    for volume in &volumes {
        if let Err(e) = engine.remove_volume(volume) {
            log::warn!("removing volume {volume} failed (continuing): {e}");
        }
    }

    if cfg.work_dir.exists() {
        fs::remove_dir_all(&cfg.work_dir)?;
    }

    Ok(())
}

use std::path::Path;

use crate::engine::ContainerEngine;

/// What an earlier deployment left behind on this host.
///
/// Built without side effects. If the engine is unreachable the
/// counts degrade to zero - "no existing installation provable" -
/// and the real error surfaces in the validator stage instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallState {
    pub dir_present: bool,
    pub containers: Vec<String>,
    pub volumes: Vec<String>,
}

impl InstallState {
    /// True if any trace of a prior deployment exists.
    #[must_use]
    pub fn detected(&self) -> bool {
        self.dir_present || !self.containers.is_empty() || !self.volumes.is_empty()
    }

    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }
}

/// Inspect the work dir and the engine for a prior deployment.
#[must_use]
pub fn scan(
    engine: &dyn ContainerEngine,
    work_dir: &Path,
    container_filter: &str,
    volume_prefix: &str,
) -> InstallState {
    let containers = engine
        .list_containers(container_filter)
        .unwrap_or_else(|e| {
            log::debug!("container listing unavailable: {e}");
            Vec::new()
        });
    let volumes = engine.list_volumes(volume_prefix).unwrap_or_else(|e| {
        log::debug!("volume listing unavailable: {e}");
        Vec::new()
    });

    InstallState {
        dir_present: work_dir.is_dir(),
        containers,
        volumes,
    }
}

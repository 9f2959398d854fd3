use crate::cmd;
use crate::error::{DeployError, DeployResult};

/// Refuse to continue unless running as root.
///
/// The workflow removes volumes and writes under `/opt`; everything
/// downstream assumes it. Queried via `id -u` like every other
/// external probe in this crate.
pub fn require_root() -> DeployResult<()> {
    let euid = cmd::run("id", &["-u"])?;
    if euid.trim() == "0" {
        Ok(())
    } else {
        Err(DeployError::NotRoot(euid))
    }
}

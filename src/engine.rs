use std::path::Path;

use crate::cmd;
use crate::error::{DeployError, DeployResult};

/// Narrow seam over the container engine.
///
/// Every stage talks to Docker through this trait so the untestable
/// parts (real sockets, real processes) stay behind one boundary.
/// The integration tests drive the stages with an in-memory fake.
pub trait ContainerEngine {
    /// Check the engine daemon is reachable.
    fn ping(&self) -> DeployResult<()>;

    /// Check the compose subsystem is available.
    fn compose_available(&self) -> DeployResult<()>;

    /// Names of containers whose name contains `filter`.
    fn list_containers(&self, filter: &str) -> DeployResult<Vec<String>>;

    /// Names of volumes starting with `prefix`.
    fn list_volumes(&self, prefix: &str) -> DeployResult<Vec<String>>;

    /// Raw `inspect` JSON for the given containers.
    fn inspect_containers(&self, names: &[String]) -> DeployResult<String>;

    fn network_exists(&self, name: &str) -> DeployResult<bool>;

    fn container_running(&self, name: &str) -> DeployResult<bool>;

    /// Networks a container is attached to.
    fn container_networks(&self, name: &str) -> DeployResult<Vec<String>>;

    /// Startup arguments of a running container.
    fn container_args(&self, name: &str) -> DeployResult<Vec<String>>;

    /// Stream a volume's full contents into a gzipped tarball at
    /// `dest`, via a disposable read-only helper container.
    fn export_volume(&self, volume: &str, dest: &Path) -> DeployResult<()>;

    /// Extract a gzipped tarball at `src` into a volume via a
    /// disposable helper container.
    fn import_volume(&self, volume: &str, src: &Path) -> DeployResult<()>;

    fn create_volume(&self, name: &str) -> DeployResult<()>;

    fn remove_volume(&self, name: &str) -> DeployResult<()>;

    fn remove_container(&self, name: &str) -> DeployResult<()>;

    fn compose_pull(&self, dir: &Path) -> DeployResult<()>;

    fn compose_up(&self, dir: &Path) -> DeployResult<()>;

    fn compose_down(&self, dir: &Path) -> DeployResult<()>;

    fn compose_ps(&self, dir: &Path) -> DeployResult<()>;
}

/// The real engine: shells out to the `docker` CLI.
pub struct DockerCli;

impl DockerCli {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn compose(dir: &Path, args: &[&str]) -> DeployResult<()> {
    let dir = path_str(dir)?;
    let mut full = vec!["compose", "--project-directory", dir];
    full.extend_from_slice(args);
    cmd::run_interactive("docker", &full)
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

fn path_str(path: &Path) -> DeployResult<&str> {
    path.to_str()
        .ok_or_else(|| DeployError::Other(format!("non-UTF8 path: {}", path.display())))
}

impl ContainerEngine for DockerCli {
    fn ping(&self) -> DeployResult<()> {
        if !cmd::command_exists("docker") {
            return Err(DeployError::CommandNotFound("docker".to_string()));
        }
        cmd::run("docker", &["info", "--format", "{{.ServerVersion}}"])
            .map(|_| ())
            .map_err(|e| DeployError::EngineUnreachable(e.to_string()))
    }

    fn compose_available(&self) -> DeployResult<()> {
        cmd::run("docker", &["compose", "version"])
            .map(|_| ())
            .map_err(|_| {
                DeployError::PrerequisiteMissing("docker compose plugin".to_string())
            })
    }

    fn list_containers(&self, filter: &str) -> DeployResult<Vec<String>> {
        let filter_arg = format!("name={filter}");
        let out = cmd::run(
            "docker",
            &[
                "ps",
                "-a",
                "--filter",
                &filter_arg,
                "--format",
                "{{.Names}}",
            ],
        )?;
        Ok(lines(&out))
    }

    fn list_volumes(&self, prefix: &str) -> DeployResult<Vec<String>> {
        let filter_arg = format!("name={prefix}");
        let out = cmd::run(
            "docker",
            &["volume", "ls", "--filter", &filter_arg, "--format", "{{.Name}}"],
        )?;
        Ok(lines(&out)
            .into_iter()
            .filter(|v| v.starts_with(prefix))
            .collect())
    }

    fn inspect_containers(&self, names: &[String]) -> DeployResult<String> {
        let mut args = vec!["inspect".to_string()];
        args.extend(names.iter().cloned());
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("docker", &refs)
    }

    fn network_exists(&self, name: &str) -> DeployResult<bool> {
        Ok(cmd::run("docker", &["network", "inspect", name]).is_ok())
    }

    fn container_running(&self, name: &str) -> DeployResult<bool> {
        match cmd::run(
            "docker",
            &["inspect", "--format", "{{.State.Running}}", name],
        ) {
            Ok(out) => Ok(out.trim() == "true"),
            Err(_) => Ok(false),
        }
    }

    fn container_networks(&self, name: &str) -> DeployResult<Vec<String>> {
        let out = cmd::run(
            "docker",
            &[
                "inspect",
                "--format",
                "{{range $k, $v := .NetworkSettings.Networks}}{{$k}}\n{{end}}",
                name,
            ],
        )?;
        Ok(lines(&out))
    }

    fn container_args(&self, name: &str) -> DeployResult<Vec<String>> {
        let out = cmd::run("docker", &["inspect", "--format", "{{json .Args}}", name])?;
        let args: Vec<String> = serde_json::from_str(&out)?;
        Ok(args)
    }

    fn export_volume(&self, volume: &str, dest: &Path) -> DeployResult<()> {
        let dir = dest
            .parent()
            .ok_or_else(|| DeployError::Other(format!("no parent dir for {}", dest.display())))?;
        let file = dest
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DeployError::Other(format!("bad tarball name: {}", dest.display())))?;

        let vol_mount = format!("{volume}:/data:ro");
        let dir_mount = format!("{}:/backup", path_str(dir)?);
        let tar_cmd = format!("tar czf /backup/{file} -C /data .");
        cmd::run(
            "docker",
            &[
                "run", "--rm", "-v", &vol_mount, "-v", &dir_mount, "alpine", "sh", "-c", &tar_cmd,
            ],
        )
        .map(|_| ())
    }

    fn import_volume(&self, volume: &str, src: &Path) -> DeployResult<()> {
        let dir = src
            .parent()
            .ok_or_else(|| DeployError::Other(format!("no parent dir for {}", src.display())))?;
        let file = src
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DeployError::Other(format!("bad tarball name: {}", src.display())))?;

        let vol_mount = format!("{volume}:/data");
        let dir_mount = format!("{}:/backup:ro", path_str(dir)?);
        let tar_cmd = format!("tar xzf /backup/{file} -C /data");
        cmd::run(
            "docker",
            &[
                "run", "--rm", "-v", &vol_mount, "-v", &dir_mount, "alpine", "sh", "-c", &tar_cmd,
            ],
        )
        .map(|_| ())
    }

    fn create_volume(&self, name: &str) -> DeployResult<()> {
        cmd::run("docker", &["volume", "create", name]).map(|_| ())
    }

    fn remove_volume(&self, name: &str) -> DeployResult<()> {
        cmd::run("docker", &["volume", "rm", name]).map(|_| ())
    }

    fn remove_container(&self, name: &str) -> DeployResult<()> {
        cmd::run("docker", &["rm", "-f", name]).map(|_| ())
    }

    fn compose_pull(&self, dir: &Path) -> DeployResult<()> {
        compose(dir, &["pull"])
    }

    fn compose_up(&self, dir: &Path) -> DeployResult<()> {
        compose(dir, &["up", "-d"])
    }

    fn compose_down(&self, dir: &Path) -> DeployResult<()> {
        compose(dir, &["down"])
    }

    fn compose_ps(&self, dir: &Path) -> DeployResult<()> {
        compose(dir, &["ps"])
    }
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

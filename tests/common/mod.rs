#![allow(dead_code)]

//! In-memory stand-in for Docker. Volumes are maps of file name to
//! bytes; exports produce real gzip files so archives on disk look
//! like the real thing.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::Path;

use aiolaunch::engine::ContainerEngine;
use aiolaunch::error::{DeployError, DeployResult};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

pub type VolumeContents = BTreeMap<String, Vec<u8>>;

#[derive(Default)]
pub struct FakeEngine {
    pub volumes: RefCell<BTreeMap<String, VolumeContents>>,
    pub containers: RefCell<Vec<String>>,
    pub networks: BTreeSet<String>,
    pub running: BTreeSet<String>,
    pub container_nets: BTreeMap<String, Vec<String>>,
    pub args: BTreeMap<String, Vec<String>>,
    pub fail_exports: BTreeSet<String>,
    pub unreachable: bool,
    pub compose_missing: bool,
    pub fail_compose_up: bool,
    pub ops: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(self, name: &str, files: &[(&str, &[u8])]) -> Self {
        let contents: VolumeContents = files
            .iter()
            .map(|(n, b)| ((*n).to_string(), b.to_vec()))
            .collect();
        self.volumes.borrow_mut().insert(name.to_string(), contents);
        self
    }

    pub fn with_container(self, name: &str) -> Self {
        self.containers.borrow_mut().push(name.to_string());
        self
    }

    pub fn with_network(mut self, name: &str) -> Self {
        self.networks.insert(name.to_string());
        self
    }

    pub fn with_running(mut self, name: &str) -> Self {
        self.running.insert(name.to_string());
        self
    }

    pub fn with_container_network(mut self, container: &str, network: &str) -> Self {
        self.container_nets
            .entry(container.to_string())
            .or_default()
            .push(network.to_string());
        self
    }

    pub fn with_args(mut self, container: &str, args: &[&str]) -> Self {
        self.args.insert(
            container.to_string(),
            args.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn failing_export(mut self, volume: &str) -> Self {
        self.fail_exports.insert(volume.to_string());
        self
    }

    pub fn volume_contents(&self, name: &str) -> Option<VolumeContents> {
        self.volumes.borrow().get(name).cloned()
    }

    pub fn op_count(&self, op: &str) -> usize {
        self.ops.borrow().iter().filter(|o| o.starts_with(op)).count()
    }
}

fn encode(contents: &VolumeContents) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    for (name, data) in contents {
        enc.write_all(&(name.len() as u32).to_be_bytes()).unwrap();
        enc.write_all(name.as_bytes()).unwrap();
        enc.write_all(&(data.len() as u32).to_be_bytes()).unwrap();
        enc.write_all(data).unwrap();
    }
    enc.finish().unwrap()
}

fn decode(bytes: &[u8]) -> VolumeContents {
    let mut dec = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    dec.read_to_end(&mut raw).unwrap();

    let mut contents = VolumeContents::new();
    let mut pos = 0;
    while pos < raw.len() {
        let name_len = u32::from_be_bytes(raw[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let name = String::from_utf8(raw[pos..pos + name_len].to_vec()).unwrap();
        pos += name_len;
        let data_len = u32::from_be_bytes(raw[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        contents.insert(name, raw[pos..pos + data_len].to_vec());
        pos += data_len;
    }
    contents
}

impl ContainerEngine for FakeEngine {
    fn ping(&self) -> DeployResult<()> {
        if self.unreachable {
            Err(DeployError::EngineUnreachable("fake daemon down".into()))
        } else {
            Ok(())
        }
    }

    fn compose_available(&self) -> DeployResult<()> {
        if self.compose_missing {
            Err(DeployError::PrerequisiteMissing(
                "docker compose plugin".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn list_containers(&self, filter: &str) -> DeployResult<Vec<String>> {
        if self.unreachable {
            return Err(DeployError::EngineUnreachable("fake daemon down".into()));
        }
        Ok(self
            .containers
            .borrow()
            .iter()
            .filter(|c| c.contains(filter))
            .cloned()
            .collect())
    }

    fn list_volumes(&self, prefix: &str) -> DeployResult<Vec<String>> {
        if self.unreachable {
            return Err(DeployError::EngineUnreachable("fake daemon down".into()));
        }
        Ok(self
            .volumes
            .borrow()
            .keys()
            .filter(|v| v.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn inspect_containers(&self, names: &[String]) -> DeployResult<String> {
        let snapshot: Vec<_> = names
            .iter()
            .map(|n| serde_json::json!({ "Name": n, "State": { "Running": self.running.contains(n) } }))
            .collect();
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    fn network_exists(&self, name: &str) -> DeployResult<bool> {
        Ok(self.networks.contains(name))
    }

    fn container_running(&self, name: &str) -> DeployResult<bool> {
        Ok(self.running.contains(name))
    }

    fn container_networks(&self, name: &str) -> DeployResult<Vec<String>> {
        Ok(self.container_nets.get(name).cloned().unwrap_or_default())
    }

    fn container_args(&self, name: &str) -> DeployResult<Vec<String>> {
        self.args
            .get(name)
            .cloned()
            .ok_or_else(|| DeployError::Other(format!("no such container: {name}")))
    }

    fn export_volume(&self, volume: &str, dest: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push(format!("export {volume}"));
        if self.fail_exports.contains(volume) {
            return Err(DeployError::Other(format!("helper container died for {volume}")));
        }
        let volumes = self.volumes.borrow();
        let contents = volumes
            .get(volume)
            .ok_or_else(|| DeployError::Other(format!("no such volume: {volume}")))?;
        std::fs::write(dest, encode(contents))?;
        Ok(())
    }

    fn import_volume(&self, volume: &str, src: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push(format!("import {volume}"));
        let bytes = std::fs::read(src)?;
        self.volumes
            .borrow_mut()
            .insert(volume.to_string(), decode(&bytes));
        Ok(())
    }

    fn create_volume(&self, name: &str) -> DeployResult<()> {
        self.ops.borrow_mut().push(format!("volume create {name}"));
        self.volumes
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn remove_volume(&self, name: &str) -> DeployResult<()> {
        self.ops.borrow_mut().push(format!("volume rm {name}"));
        self.volumes.borrow_mut().remove(name);
        Ok(())
    }

    fn remove_container(&self, name: &str) -> DeployResult<()> {
        self.ops.borrow_mut().push(format!("rm {name}"));
        self.containers.borrow_mut().retain(|c| c != name);
        Ok(())
    }

    fn compose_pull(&self, _dir: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push("compose pull".into());
        Ok(())
    }

    fn compose_up(&self, _dir: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push("compose up".into());
        if self.fail_compose_up {
            Err(DeployError::Other("compose up failed".into()))
        } else {
            Ok(())
        }
    }

    fn compose_down(&self, _dir: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push("compose down".into());
        Ok(())
    }

    fn compose_ps(&self, _dir: &Path) -> DeployResult<()> {
        self.ops.borrow_mut().push("compose ps".into());
        Ok(())
    }
}

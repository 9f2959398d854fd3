use crate::config::DeployConfig;
use crate::engine::ContainerEngine;
use crate::error::{DeployError, DeployResult};
use crate::proxy::TraefikInspector;

/// A soft requirement that was not met. The workflow may proceed,
/// but only on explicit operator override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    ProxyNotRunning(String),
    ProxyNotOnNetwork { container: String, network: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProxyNotRunning(name) => {
                write!(f, "proxy container '{name}' is not running")
            }
            Self::ProxyNotOnNetwork { container, network } => {
                write!(f, "proxy container '{container}' is not attached to network '{network}'")
            }
        }
    }
}

/// Verify the host can take this deployment.
///
/// Hard requirements (engine, compose, shared network) fail the
/// whole run immediately. Soft requirements come back as warnings
/// for the CLI layer to put in front of the operator.
pub fn run(engine: &dyn ContainerEngine, cfg: &DeployConfig) -> DeployResult<Vec<Warning>> {
    engine.ping()?;
    engine.compose_available()?;

    if !engine.network_exists(&cfg.shared_network)? {
        return Err(DeployError::PrerequisiteMissing(format!(
            "shared network '{}' does not exist",
            cfg.shared_network
        )));
    }

    let mut warnings = Vec::new();
    let proxy = TraefikInspector::new(engine, cfg);

    if proxy.is_running()? {
        if !proxy.is_attached_to(&cfg.shared_network)? {
            warnings.push(Warning::ProxyNotOnNetwork {
                container: cfg.proxy_container.clone(),
                network: cfg.shared_network.clone(),
            });
        }
    } else {
        warnings.push(Warning::ProxyNotRunning(cfg.proxy_container.clone()));
    }

    Ok(warnings)
}

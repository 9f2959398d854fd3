use crate::config::DeployConfig;
use crate::discovery;
use crate::engine::ContainerEngine;
use crate::error::DeployResult;

/// Read-only view of the Traefik container through the engine.
pub struct TraefikInspector<'a> {
    engine: &'a dyn ContainerEngine,
    container: String,
}

impl<'a> TraefikInspector<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn ContainerEngine, cfg: &DeployConfig) -> Self {
        Self {
            engine,
            container: cfg.proxy_container.clone(),
        }
    }

    pub fn is_running(&self) -> DeployResult<bool> {
        self.engine.container_running(&self.container)
    }

    pub fn is_attached_to(&self, network: &str) -> DeployResult<bool> {
        let networks = self.engine.container_networks(&self.container)?;
        Ok(networks.iter().any(|n| n == network))
    }

    /// Certificate resolver configured on the proxy, or the default
    /// when its arguments reveal nothing (or the proxy is absent).
    #[must_use]
    pub fn cert_resolver(&self) -> String {
        match self.engine.container_args(&self.container) {
            Ok(args) => discovery::parse_cert_resolver(&args),
            Err(e) => {
                log::warn!(
                    "could not inspect {} for a certificate resolver ({e}), assuming {}",
                    self.container,
                    discovery::DEFAULT_CERT_RESOLVER
                );
                discovery::DEFAULT_CERT_RESOLVER.to_string()
            }
        }
    }
}

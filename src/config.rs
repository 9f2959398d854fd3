use std::path::PathBuf;

/// Where Traefik routing metadata for the deployment lives.
///
/// Saltbox installs differ on this: some keep router rules as labels
/// on the container itself, others feed Traefik through its file
/// provider. Surfaced as an explicit choice instead of picking one
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RoutingMode {
    /// Router/service/middleware metadata as labels on the service.
    #[default]
    Labels,
    /// A separate dynamic-config YAML consumed by Traefik's file
    /// provider; the compose descriptor carries no routing labels.
    File,
}

/// How the Nextcloud hostname is derived from the base domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DomainLayout {
    /// `nextcloud.{base_domain}`
    #[default]
    Nextcloud,
    /// `cloud.{base_domain}`
    Cloud,
    /// The base domain itself.
    Bare,
}

/// Deployment parameters threaded explicitly through every stage.
///
/// Nothing in the workflow mutates the process environment or the
/// current directory; whatever a stage needs, it takes from here.
///
/// # Example
///
/// ```
/// use aiolaunch::config::{DeployConfig, DomainLayout};
///
/// let cfg = DeployConfig::new("example.com")
///     .domain_layout(DomainLayout::Cloud)
///     .public_ip("203.0.113.5");
///
/// assert_eq!(cfg.fqdn(), "cloud.example.com");
/// assert_eq!(cfg.public_ip.as_deref(), Some("203.0.113.5"));
/// ```
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub base_domain: String,
    pub domain_layout: DomainLayout,
    pub routing: RoutingMode,
    /// Traefik certificate resolver; `None` means autodetect.
    pub cert_resolver: Option<String>,
    /// Host public IPv4; `None` means discover.
    pub public_ip: Option<String>,
    /// Published management-interface port.
    pub admin_port: u16,
    /// Internal backend (Apache) port Traefik proxies to.
    pub apache_port: u16,
    pub skip_domain_validation: bool,
    pub data_dir: Option<String>,
    pub work_dir: PathBuf,
    pub backup_root: PathBuf,
    pub container_name: String,
    pub image: String,
    pub volume_prefix: String,
    pub master_volume: String,
    pub shared_network: String,
    pub proxy_container: String,
    pub traefik_config_dir: PathBuf,
}

impl DeployConfig {
    #[must_use]
    pub fn new(base_domain: &str) -> Self {
        Self {
            base_domain: base_domain.to_string(),
            domain_layout: DomainLayout::default(),
            routing: RoutingMode::default(),
            cert_resolver: None,
            public_ip: None,
            admin_port: 8080,
            apache_port: 11000,
            skip_domain_validation: true,
            data_dir: None,
            work_dir: PathBuf::from("/opt/nextcloud-aio"),
            backup_root: PathBuf::from("/opt/backup/nextcloud-aio"),
            container_name: "nextcloud-aio-mastercontainer".to_string(),
            image: "nextcloud/all-in-one:latest".to_string(),
            volume_prefix: "nextcloud_aio_".to_string(),
            master_volume: "nextcloud_aio_mastercontainer".to_string(),
            shared_network: "saltbox".to_string(),
            proxy_container: "traefik".to_string(),
            traefik_config_dir: PathBuf::from("/opt/traefik/config"),
        }
    }

    #[must_use]
    pub const fn domain_layout(mut self, layout: DomainLayout) -> Self {
        self.domain_layout = layout;
        self
    }

    #[must_use]
    pub const fn routing(mut self, mode: RoutingMode) -> Self {
        self.routing = mode;
        self
    }

    #[must_use]
    pub fn cert_resolver(mut self, name: &str) -> Self {
        self.cert_resolver = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn public_ip(mut self, ip: &str) -> Self {
        self.public_ip = Some(ip.to_string());
        self
    }

    #[must_use]
    pub const fn admin_port(mut self, port: u16) -> Self {
        self.admin_port = port;
        self
    }

    #[must_use]
    pub const fn apache_port(mut self, port: u16) -> Self {
        self.apache_port = port;
        self
    }

    #[must_use]
    pub const fn skip_domain_validation(mut self, skip: bool) -> Self {
        self.skip_domain_validation = skip;
        self
    }

    #[must_use]
    pub fn data_dir(mut self, dir: &str) -> Self {
        self.data_dir = Some(dir.to_string());
        self
    }

    #[must_use]
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    #[must_use]
    pub fn backup_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_root = dir.into();
        self
    }

    #[must_use]
    pub fn traefik_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.traefik_config_dir = dir.into();
        self
    }

    /// Full hostname the deployment will serve.
    #[must_use]
    pub fn fqdn(&self) -> String {
        match self.domain_layout {
            DomainLayout::Nextcloud => format!("nextcloud.{}", self.base_domain),
            DomainLayout::Cloud => format!("cloud.{}", self.base_domain),
            DomainLayout::Bare => self.base_domain.clone(),
        }
    }

    /// Path of the rendered compose descriptor inside the work dir.
    #[must_use]
    pub fn compose_path(&self) -> PathBuf {
        self.work_dir.join("docker-compose.yml")
    }

    /// Path of the Traefik dynamic-config document (file mode only).
    #[must_use]
    pub fn traefik_dynamic_path(&self) -> PathBuf {
        self.traefik_config_dir.join("nextcloud-aio.yml")
    }

    /// Resolver to use when autodetection found nothing.
    #[must_use]
    pub fn resolver_or_default(&self) -> &str {
        self.cert_resolver
            .as_deref()
            .unwrap_or(crate::discovery::DEFAULT_CERT_RESOLVER)
    }
}

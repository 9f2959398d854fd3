use docker_compose_types::{
    Compose, ComposeNetwork, ComposeNetworks, ComposeVolume, Environment, Labels, MapOrEmpty,
    NetworkSettings, Networks, Ports, Service, Services, TopLevelVolumes, Volumes,
};
use indexmap::IndexMap;

use crate::config::{DeployConfig, RoutingMode};

/// Render the `docker-compose.yml` for the AIO mastercontainer.
///
/// Pure: identical config in, byte-identical YAML out. The work dir
/// is wiped before rendering, so the output fully replaces whatever
/// was there - never merged.
#[must_use]
pub fn render(cfg: &DeployConfig) -> String {
    let mut services = IndexMap::new();
    services.insert(cfg.container_name.clone(), Some(master_service(cfg)));

    let compose = Compose {
        services: Services(services),
        volumes: top_level_volumes(cfg),
        networks: networks(cfg),
        ..Default::default()
    };

    serde_yaml::to_string(&compose).expect("failed to serialize compose")
}

fn master_service(cfg: &DeployConfig) -> Service {
    let mut env = vec![
        format!("APACHE_PORT={}", cfg.apache_port),
        "APACHE_IP_BINDING=0.0.0.0".to_string(),
    ];
    if cfg.skip_domain_validation {
        env.push("SKIP_DOMAIN_VALIDATION=true".to_string());
    }
    if let Some(data_dir) = &cfg.data_dir {
        env.push(format!("NEXTCLOUD_DATADIR={data_dir}"));
    }

    let networks = if cfg.routing == RoutingMode::Labels {
        Networks::Simple(vec![cfg.shared_network.clone()])
    } else {
        Networks::default()
    };

    Service {
        image: Some(cfg.image.clone()),
        container_name: Some(cfg.container_name.clone()),
        restart: Some("unless-stopped".to_string()),
        ports: Ports::Short(vec![format!("{}:8080", cfg.admin_port)]),
        volumes: vec![
            Volumes::Simple(format!("{}:/mnt/docker-aio-config", cfg.master_volume)),
            Volumes::Simple("/var/run/docker.sock:/var/run/docker.sock:ro".to_string()),
        ],
        environment: Environment::List(env),
        labels: routing_labels(cfg),
        networks,
        ..Default::default()
    }
}

fn routing_labels(cfg: &DeployConfig) -> Labels {
    if cfg.routing != RoutingMode::Labels {
        return Labels::default();
    }

    let fqdn = cfg.fqdn();
    let resolver = cfg.resolver_or_default();
    Labels::List(vec![
        "traefik.enable=true".to_string(),
        format!("traefik.http.routers.nextcloud-aio.rule=Host(`{fqdn}`)"),
        "traefik.http.routers.nextcloud-aio.entrypoints=websecure".to_string(),
        format!("traefik.http.routers.nextcloud-aio.tls.certresolver={resolver}"),
        format!(
            "traefik.http.services.nextcloud-aio.loadbalancer.server.port={}",
            cfg.apache_port
        ),
    ])
}

fn top_level_volumes(cfg: &DeployConfig) -> TopLevelVolumes {
    let mut vols = IndexMap::new();
    vols.insert(
        cfg.master_volume.clone(),
        MapOrEmpty::Map(ComposeVolume {
            driver: Some("local".to_string()),
            driver_opts: IndexMap::new(),
            external: None,
            labels: Labels::default(),
            name: Some(cfg.master_volume.clone()),
        }),
    );
    TopLevelVolumes(vols)
}

fn networks(cfg: &DeployConfig) -> ComposeNetworks {
    let mut nets = IndexMap::new();
    if cfg.routing == RoutingMode::Labels {
        nets.insert(
            cfg.shared_network.clone(),
            MapOrEmpty::Map(NetworkSettings {
                external: Some(ComposeNetwork::Bool(true)),
                ..Default::default()
            }),
        );
    }
    ComposeNetworks(nets)
}

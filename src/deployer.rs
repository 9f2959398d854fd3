use std::fs;

use crate::compose;
use crate::config::{DeployConfig, RoutingMode};
use crate::engine::ContainerEngine;
use crate::error::DeployResult;
use crate::traefik;

/// Write the rendered configuration and bring the stack up.
pub fn run(engine: &dyn ContainerEngine, cfg: &DeployConfig) -> DeployResult<()> {
    fs::create_dir_all(&cfg.work_dir)?;
    fs::write(cfg.compose_path(), compose::render(cfg))?;

    if cfg.routing == RoutingMode::File {
        fs::create_dir_all(&cfg.traefik_config_dir)?;
        fs::write(cfg.traefik_dynamic_path(), traefik::render(cfg))?;
        eprintln!(
            "Traefik dynamic config written to {}",
            cfg.traefik_dynamic_path().display()
        );
    }

    eprintln!("Pulling image {}...", cfg.image);
    engine.compose_pull(&cfg.work_dir)?;

    eprintln!("Starting containers...");
    engine.compose_up(&cfg.work_dir)?;

    fs::write(cfg.work_dir.join("SUMMARY.txt"), summary(cfg))?;

    Ok(())
}

/// Preview what a deploy would do without touching the host.
pub fn dry_run(cfg: &DeployConfig) {
    eprintln!("=== Dry run: no changes will be made ===");
    eprintln!();

    eprintln!("--- docker-compose.yml ---");
    println!("{}", compose::render(cfg));

    if cfg.routing == RoutingMode::File {
        eprintln!("--- {} ---", cfg.traefik_dynamic_path().display());
        println!("{}", traefik::render(cfg));
    }

    eprintln!("--- Actions that would be performed ---");
    eprintln!("1. Write config files to {}/", cfg.work_dir.display());
    eprintln!("2. Pull image {}", cfg.image);
    eprintln!("3. Start containers via docker compose");
    eprintln!("4. Poll the management interface until ready");
}

/// Post-run summary dropped next to the compose file for later
/// reference.
#[must_use]
pub fn summary(cfg: &DeployConfig) -> String {
    let mut out = String::new();
    out.push_str("Nextcloud AIO deployment summary\n");
    out.push_str("================================\n\n");
    out.push_str(&format!("Hostname:           https://{}\n", cfg.fqdn()));
    if let Some(ip) = &cfg.public_ip {
        out.push_str(&format!("Public IP:          {ip}\n"));
    }
    out.push_str(&format!(
        "Management UI:      https://<server>:{}\n",
        cfg.admin_port
    ));
    out.push_str(&format!("Backend port:       {}\n", cfg.apache_port));
    out.push_str(&format!(
        "Certificate resolver: {}\n",
        cfg.resolver_or_default()
    ));
    out.push_str("\nOpen the management UI to fetch the initial passphrase:\n");
    out.push_str(&format!(
        "  docker logs {} 2>&1 | grep -i passphrase\n",
        cfg.container_name
    ));
    out
}

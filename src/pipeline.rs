use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::backup;
use crate::config::{DeployConfig, DomainLayout, RoutingMode};
use crate::deployer;
use crate::detect;
use crate::discovery::{self, CurlFetcher, IpFetcher};
use crate::engine::{ContainerEngine, DockerCli};
use crate::error::{DeployError, DeployResult};
use crate::health::{CurlProbe, Monitor, Outcome};
use crate::preflight;
use crate::proxy::TraefikInspector;
use crate::reset;
use crate::restore;
use crate::validate;

/// The interactive workflow. All prompting lives here; every stage
/// below it takes resolved values and an engine handle.
pub struct Pipeline {
    engine: DockerCli,
}

impl Pipeline {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            engine: DockerCli::new(),
        }
    }

    /// Parse CLI arguments and dispatch the appropriate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatched command fails. An
    /// operator declining a confirmation is a clean `Ok` exit.
    pub fn run(&self) -> DeployResult<()> {
        let cli = Cli::parse();

        match cli.command {
            Command::Deploy {
                domain,
                layout,
                routing,
                data_dir,
                force,
                dry_run,
                skip_backup,
            } => {
                let cfg = self.collect_config(domain, layout, routing, data_dir)?;
                if dry_run {
                    deployer::dry_run(&cfg);
                    return Ok(());
                }
                self.cmd_deploy(cfg, force, skip_backup)
            }
            Command::Backup => self.cmd_backup(),
            Command::Restore { archive, yes } => self.cmd_restore(&archive, yes),
            Command::Status => self.cmd_status(),
            Command::Destroy { backup } => self.cmd_destroy(backup),
        }
    }

    fn collect_config(
        &self,
        domain: Option<String>,
        layout: Option<DomainLayout>,
        routing: Option<RoutingMode>,
        data_dir: Option<String>,
    ) -> DeployResult<DeployConfig> {
        let domain = match domain {
            Some(d) => d,
            None => prompt_line("Base domain (e.g. example.com): ")?,
        };
        if domain.is_empty() {
            return Err(DeployError::Other("no domain given".into()));
        }

        let layout = match layout {
            Some(l) => l,
            None => {
                let answer = prompt_line(
                    "Hostname layout - [n]extcloud.domain, [c]loud.domain, [b]are domain [n]: ",
                )?;
                match answer.chars().next() {
                    Some('c' | 'C') => DomainLayout::Cloud,
                    Some('b' | 'B') => DomainLayout::Bare,
                    _ => DomainLayout::Nextcloud,
                }
            }
        };

        let mut cfg = DeployConfig::new(&domain).domain_layout(layout);
        if let Some(mode) = routing {
            cfg = cfg.routing(mode);
        }
        if let Some(dir) = data_dir {
            cfg = cfg.data_dir(&dir);
        }
        Ok(cfg)
    }

    fn cmd_deploy(&self, mut cfg: DeployConfig, force: bool, skip_backup: bool) -> DeployResult<()> {
        preflight::require_root()?;

        let state = detect::scan(
            &self.engine,
            &cfg.work_dir,
            &cfg.container_name,
            &cfg.volume_prefix,
        );

        if state.detected() {
            eprintln!(
                "Existing installation detected: {} container(s), {} volume(s), work dir {}.",
                state.container_count(),
                state.volume_count(),
                if state.dir_present { "present" } else { "absent" },
            );

            if !skip_backup && confirm_soft("Back it up before removal? [y/N]: ")? {
                report_backup(&backup::run(&self.engine, &cfg)?);
            }

            if !force
                && !confirm_literal(
                    "The existing installation will be REMOVED. Type 'yes' to continue: ",
                )?
            {
                eprintln!("Aborted.");
                return Ok(());
            }

            reset::run(&self.engine, &cfg)?;
        }

        let warnings = validate::run(&self.engine, &cfg)?;
        if !warnings.is_empty() {
            for warning in &warnings {
                log::warn!("{warning}");
            }
            if !force && !confirm_literal("Continue anyway? Type 'yes' to continue: ")? {
                eprintln!("Aborted.");
                return Ok(());
            }
        }

        if cfg.public_ip.is_none() {
            cfg.public_ip = Some(resolve_public_ip(&CurlFetcher)?);
        }
        if cfg.cert_resolver.is_none() {
            let resolver = TraefikInspector::new(&self.engine, &cfg).cert_resolver();
            eprintln!("Using certificate resolver: {resolver}");
            cfg.cert_resolver = Some(resolver);
        }

        deployer::run(&self.engine, &cfg)?;

        eprintln!("Waiting for Nextcloud AIO to come up...");
        let outcome = Monitor::new().wait(&CurlProbe, &crate::health::endpoints(&cfg));
        if outcome == Outcome::TimedOut {
            log::warn!(
                "Nextcloud AIO did not answer in time; check 'docker logs {}'",
                cfg.container_name
            );
        }

        eprintln!();
        eprintln!("Deployment complete!");
        eprintln!("Management UI: https://<server>:{}", cfg.admin_port);
        eprintln!("Application:   https://{}", cfg.fqdn());
        Ok(())
    }

    fn cmd_backup(&self) -> DeployResult<()> {
        preflight::require_root()?;
        let cfg = DeployConfig::new("");

        let state = detect::scan(
            &self.engine,
            &cfg.work_dir,
            &cfg.container_name,
            &cfg.volume_prefix,
        );
        if !state.detected() {
            eprintln!("Nothing to back up: no existing installation found.");
            return Ok(());
        }

        report_backup(&backup::run(&self.engine, &cfg)?);
        Ok(())
    }

    fn cmd_restore(&self, archive: &Path, yes: bool) -> DeployResult<()> {
        preflight::require_root()?;
        let cfg = DeployConfig::new("");

        eprintln!(
            "This will OVERWRITE the installation at {} from {}.",
            cfg.work_dir.display(),
            archive.display()
        );
        if !yes && !confirm_literal("Type 'yes' to continue: ")? {
            eprintln!("Aborted.");
            return Ok(());
        }

        restore::run(&self.engine, &cfg, archive)
    }

    fn cmd_status(&self) -> DeployResult<()> {
        let cfg = DeployConfig::new("");
        self.engine.compose_ps(&cfg.work_dir)
    }

    fn cmd_destroy(&self, with_backup: bool) -> DeployResult<()> {
        preflight::require_root()?;
        let cfg = DeployConfig::new("");

        eprintln!(
            "WARNING: this permanently removes the installation at {} and all {}* volumes.",
            cfg.work_dir.display(),
            cfg.volume_prefix
        );
        if !confirm_literal("Type 'yes' to continue: ")? {
            eprintln!("Aborted.");
            return Ok(());
        }

        if with_backup {
            report_backup(&backup::run(&self.engine, &cfg)?);
        }

        reset::run(&self.engine, &cfg)?;
        eprintln!("Cleanup complete!");
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Discover the public IPv4, falling back to manual entry when
/// every provider fails. A persistently invalid manual value is
/// fatal.
fn resolve_public_ip(fetcher: &dyn IpFetcher) -> DeployResult<String> {
    if let Some(ip) = discovery::discover_public_ip(fetcher) {
        eprintln!("Public IP: {ip}");
        return Ok(ip);
    }

    eprintln!("Automatic public IP discovery failed.");
    let manual = prompt_line("Enter the server's public IPv4 address: ")?;
    if discovery::is_valid_ipv4(&manual) {
        Ok(manual)
    } else {
        Err(DeployError::InvalidIp(manual))
    }
}

fn prompt_line(prompt: &str) -> DeployResult<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Soft opt-in: `y` or `yes`, any case.
fn confirm_soft(prompt: &str) -> DeployResult<bool> {
    let answer = prompt_line(prompt)?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Destructive gate: a literal `yes`, nothing less.
fn confirm_literal(prompt: &str) -> DeployResult<bool> {
    let answer = prompt_line(prompt)?;
    Ok(answer == "yes")
}

fn report_backup(report: &backup::BackupReport) {
    let mb = report.total_bytes / (1024 * 1024);
    if report.valid {
        eprintln!(
            "Backup complete: {} volume(s), {mb} MB at {}",
            report.volume_count(),
            report.archive_dir.display()
        );
    } else {
        log::warn!(
            "backup at {} looks INCOMPLETE ({} volume(s) archived, {} skipped) - \
             inspect it before relying on it",
            report.archive_dir.display(),
            report.volume_count(),
            report.volumes_skipped.len()
        );
    }
}

#[derive(Parser)]
#[command(name = "aiolaunch")]
#[command(about = "Deploy Nextcloud All-in-One behind Traefik on a Saltbox host")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect, back up, reset, and deploy Nextcloud AIO
    Deploy {
        /// Base domain (prompted for when omitted)
        #[arg(long)]
        domain: Option<String>,

        /// Hostname layout relative to the base domain
        #[arg(long, value_enum)]
        layout: Option<DomainLayout>,

        /// Where Traefik routing metadata lives
        #[arg(long, value_enum)]
        routing: Option<RoutingMode>,

        /// Host path for Nextcloud's data directory
        #[arg(long)]
        data_dir: Option<String>,

        /// Skip confirmations and soft-requirement overrides
        #[arg(long)]
        force: bool,

        /// Preview generated files without executing
        #[arg(long)]
        dry_run: bool,

        /// Never offer a backup of the existing installation
        #[arg(long)]
        skip_backup: bool,
    },

    /// Archive the current installation without touching it
    Backup,

    /// Replay a backup archive against this host
    Restore {
        /// Path to a timestamped archive directory
        archive: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show container status for the current installation
    Status,

    /// Tear down the installation (optionally backing up first)
    Destroy {
        /// Take a backup before removal
        #[arg(long)]
        backup: bool,
    },
}

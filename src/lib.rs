//! Deploy Nextcloud All-in-One behind Traefik on a Saltbox host.
//!
//! aiolaunch replaces the usual pile of shell scripts with a typed
//! workflow: it detects an existing installation, optionally backs
//! it up into a self-restoring archive, tears it down, validates the
//! host, discovers the public IP and Traefik's certificate resolver,
//! renders `docker-compose.yml` (and, in file-provider mode, a
//! Traefik dynamic-config document), brings the container up, and
//! polls until the management UI answers.
//!
//! # Architecture
//!
//! One linear pipeline of stage functions, each taking an explicit
//! [`DeployConfig`](config::DeployConfig) and a
//! [`ContainerEngine`](engine::ContainerEngine) handle:
//!
//! 1. **Preflight** - root check ([`preflight`])
//! 2. **Detect** - prior-installation scan ([`detect`])
//! 3. **Backup** - volume tarballs + config snapshot + standalone
//!    restore script ([`backup`], [`restore`])
//! 4. **Reset** - containers, volumes, work dir ([`reset`])
//! 5. **Validate** - engine/compose/network hard checks, proxy soft
//!    checks ([`validate`])
//! 6. **Discover** - public IP chain, certificate resolver
//!    ([`discovery`], [`proxy`])
//! 7. **Render** - compose descriptor and Traefik dynamic config
//!    ([`compose`], [`traefik`])
//! 8. **Deploy & monitor** - pull, up, HTTP readiness polling
//!    ([`deployer`], [`health`])
//!
//! Docker is only ever reached through the
//! [`ContainerEngine`](engine::ContainerEngine) trait, so every
//! stage runs against an in-memory fake in the test suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use aiolaunch::Pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!     Pipeline::new().run()?;
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::option_if_let_else
)]

pub mod backup;
pub mod cmd;
pub mod compose;
pub mod config;
pub mod deployer;
pub mod detect;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod preflight;
pub mod proxy;
pub mod reset;
pub mod restore;
pub mod traefik;
pub mod validate;

pub use config::{DeployConfig, DomainLayout, RoutingMode};
pub use engine::{ContainerEngine, DockerCli};
pub use error::{DeployError, DeployResult};
pub use pipeline::Pipeline;

use std::thread;
use std::time::Duration;

use crate::cmd;
use crate::config::{DeployConfig, RoutingMode};
use crate::error::{DeployError, DeployResult};

/// Fetches only the HTTP status code of a URL; the probe seam for
/// the monitor so tests can script responses.
pub trait HttpProbe {
    fn status(&self, url: &str) -> DeployResult<u16>;
}

/// Real probe: `curl -ksS -o /dev/null -w '%{http_code}'`.
pub struct CurlProbe;

impl HttpProbe for CurlProbe {
    fn status(&self, url: &str) -> DeployResult<u16> {
        let out = cmd::run(
            "curl",
            &[
                "-ksS",
                "-o",
                "/dev/null",
                "-w",
                "%{http_code}",
                "--max-time",
                "10",
                url,
            ],
        )?;
        out.trim()
            .parse()
            .map_err(|_| DeployError::ProbeFailed(url.to_string(), format!("bad status: {out}")))
    }
}

/// One polling step's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady,
}

/// Terminal outcome of the monitor. `TimedOut` is non-fatal by
/// design: the operator is told to check logs, the run still
/// succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ready,
    TimedOut,
}

/// 2xx and 3xx mean the endpoint answers; anything else means keep
/// waiting.
#[must_use]
pub const fn classify(status: u16) -> Readiness {
    if matches!(status, 200..=399) {
        Readiness::Ready
    } else {
        Readiness::NotReady
    }
}

/// Endpoints worth probing for this deployment, most local first.
#[must_use]
pub fn endpoints(cfg: &DeployConfig) -> Vec<String> {
    let mut urls = vec![format!("https://localhost:{}", cfg.admin_port)];
    urls.push(format!("https://{}", cfg.fqdn()));
    if cfg.routing == RoutingMode::File {
        urls.push(format!("http://localhost:{}", cfg.apache_port));
    }
    urls
}

/// Fixed-interval polling loop over the endpoint list.
///
/// Two live states (waiting, ready) and one terminal fallback
/// (timed out). Ready as soon as any endpoint answers 2xx/3xx.
pub struct Monitor {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Monitor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 36,
        }
    }

    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn wait(&self, probe: &dyn HttpProbe, urls: &[String]) -> Outcome {
        for attempt in 1..=self.max_attempts {
            for url in urls {
                match probe.status(url) {
                    Ok(status) if classify(status) == Readiness::Ready => {
                        eprintln!("  {url} answered {status} - ready");
                        return Outcome::Ready;
                    }
                    Ok(status) => {
                        log::debug!("{url} answered {status}, not ready yet");
                    }
                    Err(e) => {
                        log::debug!("{url} unreachable: {e}");
                    }
                }
            }
            eprintln!(
                "  Waiting for Nextcloud AIO ({attempt}/{})...",
                self.max_attempts
            );
            if attempt < self.max_attempts {
                thread::sleep(self.interval);
            }
        }
        Outcome::TimedOut
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

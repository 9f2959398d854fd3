use std::sync::OnceLock;

use regex::Regex;

use crate::cmd;
use crate::error::DeployResult;

/// Resolver name assumed when the proxy's arguments reveal nothing.
///
/// Guessing keeps the workflow moving; a wrong guess only surfaces
/// later as a certificate-issuance failure inside Traefik.
pub const DEFAULT_CERT_RESOLVER: &str = "cfdns";

/// Lookup services tried in order for the host's public IPv4.
pub const IP_PROVIDERS: &[&str] = &[
    "https://ifconfig.me/ip",
    "https://api.ipify.org",
    "https://ipv4.icanhazip.com",
];

/// Fetches a short plain-text HTTP body. One method, so tests can
/// script the provider chain.
pub trait IpFetcher {
    fn fetch(&self, url: &str) -> DeployResult<String>;
}

/// Real fetcher: `curl` with a short timeout.
pub struct CurlFetcher;

impl IpFetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> DeployResult<String> {
        cmd::run("curl", &["-fsS", "--max-time", "10", url])
    }
}

/// Strict dotted-quad check: four octets, each 0-255, nothing else.
#[must_use]
pub fn is_valid_ipv4(candidate: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("static pattern")
    });

    let Some(caps) = re.captures(candidate) else {
        return false;
    };
    (1..=4).all(|i| caps[i].parse::<u16>().is_ok_and(|octet| octet <= 255))
}

/// Try each provider in order; first response that is a strict
/// IPv4 dotted quad wins. `None` means every provider failed and
/// the caller must fall back to manual entry.
#[must_use]
pub fn discover_public_ip(fetcher: &dyn IpFetcher) -> Option<String> {
    for provider in IP_PROVIDERS {
        match fetcher.fetch(provider) {
            Ok(body) => {
                let candidate = body.trim().to_string();
                if is_valid_ipv4(&candidate) {
                    return Some(candidate);
                }
                log::warn!("{provider} returned a non-IPv4 response: {candidate:?}");
            }
            Err(e) => log::warn!("public IP lookup via {provider} failed: {e}"),
        }
    }
    None
}

/// Extract the certificate-resolver name from the proxy's startup
/// arguments, e.g. `--certificatesresolvers.cfdns.acme.email=...`.
/// Falls back to [`DEFAULT_CERT_RESOLVER`] when absent.
#[must_use]
pub fn parse_cert_resolver(args: &[String]) -> String {
    args.iter()
        .find_map(|arg| {
            let rest = arg
                .strip_prefix("--certificatesresolvers.")
                .or_else(|| arg.strip_prefix("--certificatesResolvers."))?;
            let name = rest.split('.').next()?;
            (!name.is_empty()).then(|| name.to_string())
        })
        .unwrap_or_else(|| DEFAULT_CERT_RESOLVER.to_string())
}

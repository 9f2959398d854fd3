//! Traefik dynamic-config renderer for the file-provider routing
//! mode. Typed structs serialized with `serde_yaml`, so structural
//! validity and quoting come from serde instead of string splicing.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::DeployConfig;

#[derive(Serialize)]
struct DynamicConfig {
    http: HttpConfig,
}

#[derive(Serialize)]
struct HttpConfig {
    routers: IndexMap<String, Router>,
    services: IndexMap<String, BackendService>,
    middlewares: IndexMap<String, Middleware>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Router {
    rule: String,
    entry_points: Vec<String>,
    service: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    middlewares: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls: Option<RouterTls>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouterTls {
    cert_resolver: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackendService {
    load_balancer: LoadBalancer,
}

#[derive(Serialize)]
struct LoadBalancer {
    servers: Vec<BackendServer>,
}

#[derive(Serialize)]
struct BackendServer {
    url: String,
}

// Traefik keys each middleware by its type name, so this must come
// out as a nested `redirectScheme:` / `headers:` mapping rather than
// an enum tag.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Middleware {
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_scheme: Option<RedirectScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<SecurityHeaders>,
}

#[derive(Serialize)]
struct RedirectScheme {
    scheme: String,
    permanent: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecurityHeaders {
    sts_seconds: u32,
    sts_include_subdomains: bool,
    sts_preload: bool,
    content_type_nosniff: bool,
    frame_deny: bool,
    referrer_policy: String,
}

/// Render the dynamic-config document: two routers (plain HTTP
/// redirecting, TLS-terminated), one backend service pointing at
/// the discovered IP and internal port, two middlewares.
///
/// Pure: identical config in, byte-identical YAML out.
#[must_use]
pub fn render(cfg: &DeployConfig) -> String {
    let fqdn = cfg.fqdn();
    let rule = format!("Host(`{fqdn}`)");
    let backend_host = cfg.public_ip.as_deref().unwrap_or("127.0.0.1");

    let mut routers = IndexMap::new();
    routers.insert(
        "nextcloud-aio".to_string(),
        Router {
            rule: rule.clone(),
            entry_points: vec!["websecure".to_string()],
            service: "nextcloud-aio".to_string(),
            middlewares: vec!["nextcloud-aio-headers".to_string()],
            tls: Some(RouterTls {
                cert_resolver: cfg.resolver_or_default().to_string(),
            }),
        },
    );
    routers.insert(
        "nextcloud-aio-http".to_string(),
        Router {
            rule,
            entry_points: vec!["web".to_string()],
            service: "nextcloud-aio".to_string(),
            middlewares: vec!["nextcloud-aio-redirect".to_string()],
            tls: None,
        },
    );

    let mut services = IndexMap::new();
    services.insert(
        "nextcloud-aio".to_string(),
        BackendService {
            load_balancer: LoadBalancer {
                servers: vec![BackendServer {
                    url: format!("http://{backend_host}:{}", cfg.apache_port),
                }],
            },
        },
    );

    let mut middlewares = IndexMap::new();
    middlewares.insert(
        "nextcloud-aio-redirect".to_string(),
        Middleware {
            redirect_scheme: Some(RedirectScheme {
                scheme: "https".to_string(),
                permanent: true,
            }),
            headers: None,
        },
    );
    middlewares.insert(
        "nextcloud-aio-headers".to_string(),
        Middleware {
            redirect_scheme: None,
            headers: Some(SecurityHeaders {
                sts_seconds: 31_536_000,
                sts_include_subdomains: true,
                sts_preload: true,
                content_type_nosniff: true,
                frame_deny: true,
                referrer_policy: "no-referrer".to_string(),
            }),
        },
    );

    let doc = DynamicConfig {
        http: HttpConfig {
            routers,
            services,
            middlewares,
        },
    };

    serde_yaml::to_string(&doc).expect("failed to serialize traefik config")
}

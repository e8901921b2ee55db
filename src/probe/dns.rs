//! DNS prober backed by hickory-resolver.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, NameServerConfigGroup, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::{ResolveError, Resolver};

use crate::config::{ProbeConfig, ResolverConfig, ResolverStrategy};
use crate::probe::prober::{LookupError, Prober};

/// Errors building the resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("failed to read system resolver config: {0}")]
    System(#[from] ResolveError),

    #[error("invalid dns server url: {0}")]
    InvalidServer(String),
}

/// A-record prober over the system or configured nameservers.
pub struct DnsProber {
    resolver: Resolver<TokioConnectionProvider>,
    timeout: Duration,
}

impl std::fmt::Debug for DnsProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsProber")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DnsProber {
    pub fn new(config: &ResolverConfig, probe: &ProbeConfig) -> Result<Self, ResolverError> {
        let timeout = Duration::from_millis(probe.timeout_ms);

        let resolver = match config.strategy {
            ResolverStrategy::System => {
                let mut builder = Resolver::builder_tokio()?;
                tune(builder.options_mut(), timeout);
                builder.build()
            }
            ResolverStrategy::Custom => {
                let name_servers = parse_server_urls(&config.servers)?;
                let resolver_config = hickory_resolver::config::ResolverConfig::from_parts(
                    None,
                    vec![],
                    name_servers,
                );
                let mut builder = Resolver::builder_with_config(
                    resolver_config,
                    TokioConnectionProvider::default(),
                );
                tune(builder.options_mut(), timeout);
                builder.build()
            }
        };

        tracing::debug!(
            strategy = ?config.strategy,
            servers = config.servers.len(),
            timeout_ms = probe.timeout_ms,
            "DNS prober ready"
        );
        Ok(Self { resolver, timeout })
    }
}

/// One query, one attempt, bounded by the probe timeout.
fn tune(opts: &mut ResolverOpts, timeout: Duration) {
    opts.timeout = timeout;
    opts.attempts = 1;
}

#[async_trait]
impl Prober for DnsProber {
    async fn lookup(&self, domain: &str) -> Result<(), LookupError> {
        // The resolver's own timeout covers a single server; this bounds the
        // whole lookup when several servers are configured.
        let lookup = tokio::time::timeout(self.timeout, self.resolver.ipv4_lookup(domain)).await;

        match lookup {
            Err(_) => Err(LookupError::Timeout),
            Ok(Ok(answer)) if answer.iter().next().is_some() => Ok(()),
            Ok(Ok(_)) => Err(LookupError::NoAnswer),
            Ok(Err(e)) => Err(lookup_error(&e)),
        }
    }
}

fn lookup_error(e: &ResolveError) -> LookupError {
    if e.is_nx_domain() {
        LookupError::NxDomain
    } else if e.is_no_records_found() {
        LookupError::NoAnswer
    } else if e
        .proto()
        .is_some_and(|proto| matches!(proto.kind(), ProtoErrorKind::Timeout))
    {
        LookupError::Timeout
    } else {
        LookupError::Failed(e.to_string())
    }
}

/// Parse `udp://host[:port]` / `tcp://host[:port]` nameserver URLs.
fn parse_server_urls(urls: &[String]) -> Result<NameServerConfigGroup, ResolverError> {
    let mut configs = Vec::with_capacity(urls.len());

    for url in urls {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ResolverError::InvalidServer(format!("missing scheme: {url}")))?;
        let protocol = match scheme {
            "udp" => Protocol::Udp,
            "tcp" => Protocol::Tcp,
            other => {
                return Err(ResolverError::InvalidServer(format!(
                    "unsupported protocol {other}: {url}"
                )))
            }
        };

        configs.push(NameServerConfig {
            socket_addr: parse_socket_addr(rest)?,
            protocol,
            tls_dns_name: None,
            http_endpoint: None,
            trust_negative_responses: true,
            bind_addr: None,
        });
    }

    if configs.is_empty() {
        return Err(ResolverError::InvalidServer("no dns servers configured".to_string()));
    }
    Ok(NameServerConfigGroup::from(configs))
}

/// `8.8.8.8`, `8.8.8.8:5353`, `[2606:4700::1111]`, `[::1]:53`.
fn parse_socket_addr(s: &str) -> Result<SocketAddr, ResolverError> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let bare = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')).unwrap_or(s);
    bare.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ResolverError::InvalidServer(format!("expected an IP address: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::probe::ProbeOutcome;

    fn custom_prober(server: &str, timeout_ms: u64) -> DnsProber {
        let resolver = ResolverConfig {
            strategy: ResolverStrategy::Custom,
            servers: vec![server.to_string()],
        };
        let probe = ProbeConfig {
            timeout_ms,
            ..ProbeConfig::default()
        };
        DnsProber::new(&resolver, &probe).unwrap()
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Discard port: the query is sent and never answered.
        let prober = custom_prober("udp://127.0.0.1:9", 300);

        let result = prober.lookup("ads.example.com").await;

        assert_eq!(result, Err(LookupError::Timeout));
        assert_eq!(FailurePolicy::NxdomainOnly.classify(&result), ProbeOutcome::Resolved);
        assert_eq!(FailurePolicy::Strict.classify(&result), ProbeOutcome::Unresolved);
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_failure() {
        let prober = custom_prober("tcp://127.0.0.1:1", 2000);

        let result = prober.lookup("ads.example.com").await;

        assert!(matches!(result, Err(LookupError::Failed(_))), "got {result:?}");
        assert_eq!(FailurePolicy::NxdomainOnly.classify(&result), ProbeOutcome::Resolved);
    }

    #[test]
    fn test_parse_udp_default_port() {
        let group = parse_server_urls(&["udp://9.9.9.9".to_string()]).unwrap();
        assert_eq!(group.len(), 1);
        assert_eq!(parse_socket_addr("9.9.9.9").unwrap(), "9.9.9.9:53".parse().unwrap());
    }

    #[test]
    fn test_parse_tcp_with_port_and_ipv6() {
        let urls = vec!["tcp://1.1.1.1:5353".to_string(), "udp://[::1]".to_string()];
        assert_eq!(parse_server_urls(&urls).unwrap().len(), 2);
        assert_eq!(parse_socket_addr("[::1]").unwrap(), "[::1]:53".parse().unwrap());
    }

    #[test]
    fn test_rejects_unsupported_scheme_and_hostnames() {
        assert!(parse_server_urls(&["https://dns.google/dns-query".to_string()]).is_err());
        assert!(parse_server_urls(&["udp://dns.google".to_string()]).is_err());
        assert!(parse_server_urls(&["9.9.9.9".to_string()]).is_err());
        assert!(parse_server_urls(&[]).is_err());
    }
}

//! Resolves the scan target once, before any worker starts.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use hickory_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};
use itertools::Itertools;
use log::debug;
use tokio::{fs, io};

/// How long the backup resolver waits on one name server.
const RESOLVER_TIMEOUT: Duration = Duration::from_secs(2);

/// Turns `host` into the single address every probe of the scan will use.
///
/// Literal IPs (bracketed IPv6 included) are used as is. Names go through
/// the system resolver first and the DNS resolver described by `resolver`
/// second. When a name maps to several addresses the first IPv4 one wins,
/// otherwise the first one returned.
///
/// ```rust
/// # use portsweep::address::resolve_host;
/// # use std::net::{IpAddr, Ipv4Addr};
/// # tokio_test_block_on(async {
/// let ip = resolve_host("127.0.0.1", None).await;
/// assert_eq!(ip, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub async fn resolve_host(host: &str, resolver: Option<&str>) -> Option<IpAddr> {
    let host = host.trim();
    let literal = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(ip) = IpAddr::from_str(literal) {
        return Some(ip);
    }

    let candidates = resolve_ips_from_host(host, resolver).await;
    debug!("{host} resolved to {candidates:?}");

    candidates
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
}

/// Uses DNS to get the IPs associated with host
async fn resolve_ips_from_host(source: &str, resolver: Option<&str>) -> Vec<IpAddr> {
    if let Ok(addrs) = tokio::net::lookup_host((source, 80)).await {
        let ips = addrs.map(|x| x.ip()).unique().collect_vec();
        if !ips.is_empty() {
            return ips;
        }
    }

    let backup_resolver = get_resolver(resolver).await;
    match backup_resolver.lookup_ip(source).await {
        Ok(addrs) => addrs.iter().unique().collect_vec(),
        Err(e) => {
            debug!("Backup resolver could not resolve {source}: {e}");
            Vec::new()
        }
    }
}

/// Derive a DNS resolver.
///
/// 1. if the `resolver` parameter has been set:
///     1. assume the parameter is a path and attempt to read IPs.
///     2. parse the input as a comma-separated list of IPs.
/// 2. if `resolver` is not set:
///    1. attempt to derive a resolver from the system config. (e.g.
///       `/etc/resolv.conf` on *nix).
///    2. finally, build a CloudFlare-based resolver (default
///       behaviour).
async fn get_resolver(resolver: Option<&str>) -> TokioAsyncResolver {
    match resolver {
        Some(r) => {
            let mut config = ResolverConfig::new();
            let resolver_ips = match read_resolver_from_file(r).await {
                Ok(ips) => ips,
                Err(_) => parse_resolver_list(r),
            };
            for ip in resolver_ips {
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(ip, 53),
                    Protocol::Udp,
                ));
            }
            TokioAsyncResolver::tokio(config, resolver_opts())
        }
        None => TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
            TokioAsyncResolver::tokio(ResolverConfig::cloudflare_tls(), resolver_opts())
        }),
    }
}

/// One short try per name server, so a dead resolver cannot stall the scan.
fn resolver_opts() -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = RESOLVER_TIMEOUT;
    opts.attempts = 1;
    opts
}

fn parse_resolver_list(list: &str) -> Vec<IpAddr> {
    list.split(',')
        .filter_map(|r| IpAddr::from_str(r.trim()).ok())
        .collect()
}

/// Parses an input file of IPs for use in DNS resolution.
async fn read_resolver_from_file(path: &str) -> io::Result<Vec<IpAddr>> {
    let ips = fs::read_to_string(path)
        .await?
        .lines()
        .filter_map(|line| IpAddr::from_str(line.trim()).ok())
        .collect();

    Ok(ips)
}

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::lookup::validate_host_name;

pub const MAX_SERVERS: usize = 32;
pub const MAX_SEARCH_DOMAINS: usize = 6;
pub const NAMESERVER_PORT: u16 = 53;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRIES: u32 = 2;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Name servers, search domains, and timing used by one resolver session.
///
/// Lookups only ever read the configuration; every session owns its own
/// copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    servers: Vec<SocketAddr>,
    search_domains: Vec<String>,
    timeout: Duration,
    retries: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            servers: vec![loopback()],
            search_domains: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> ResolverConfig {
        ResolverConfig::default()
    }

    /// Reads the system resolver configuration, falling back to the
    /// defaults when it cannot be read.
    pub fn system() -> ResolverConfig {
        match ResolverConfig::from_file(RESOLV_CONF) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = RESOLV_CONF, error = %e, "using default resolver configuration");
                ResolverConfig::default()
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ResolverConfig> {
        let text = fs::read_to_string(path)?;
        Ok(ResolverConfig::from_resolv_conf(&text))
    }

    /// Parses the `nameserver`, `search` and `domain` lines of a
    /// resolv.conf file. Entries beyond the resolver limits and entries
    /// that do not parse are skipped.
    pub fn from_resolv_conf(text: &str) -> ResolverConfig {
        let mut config = ResolverConfig::default();
        let mut servers = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("nameserver") => match fields.next().map(parse_server) {
                    Some(Ok(server)) if servers.len() < MAX_SERVERS => servers.push(server),
                    Some(Ok(server)) => debug!(%server, "ignoring name server beyond resolver limit"),
                    Some(Err(e)) => debug!(error = %e, "ignoring name server entry"),
                    None => {}
                },
                //The last of "search" and "domain" wins
                Some("search") | Some("domain") => {
                    config.search_domains = fields
                        .map(|d| d.trim_end_matches('.'))
                        .filter(|d| validate_host_name(d).is_ok())
                        .take(MAX_SEARCH_DOMAINS)
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }

        if !servers.is_empty() {
            config.servers = servers;
        }
        config
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    pub fn search_domains(&self) -> &[String] {
        &self.search_domains
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Replaces the name server list. An unspecified address stands for
    /// the local host.
    pub fn set_servers(&mut self, servers: Vec<SocketAddr>) -> Result<()> {
        if servers.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one DNS server address required".to_string(),
            ));
        }
        if servers.len() > MAX_SERVERS {
            return Err(Error::InvalidArgument(
                "number of DNS server addresses exceeds resolver limit".to_string(),
            ));
        }
        self.servers = servers
            .into_iter()
            .map(|server| {
                if server.ip().is_unspecified() {
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), server.port())
                } else {
                    server
                }
            })
            .collect();
        Ok(())
    }

    pub fn set_search_domains(&mut self, domains: Vec<String>) -> Result<()> {
        if domains.len() > MAX_SEARCH_DOMAINS {
            return Err(Error::InvalidArgument(format!(
                "number of search domains exceeds resolver limit of {}",
                MAX_SEARCH_DOMAINS
            )));
        }
        for domain in &domains {
            validate_host_name(domain)?;
        }
        self.search_domains = domains;
        Ok(())
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::InvalidArgument("timeout must be positive".to_string()));
        }
        self.timeout = timeout;
        Ok(())
    }

    pub fn set_retries(&mut self, retries: u32) {
        self.retries = retries;
    }
}

/// Parses `addr` or `addr:port`; the port defaults to 53.
pub fn parse_server(s: &str) -> Result<SocketAddr> {
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, NAMESERVER_PORT));
    }
    s.parse::<SocketAddr>()
        .map_err(|_| Error::InvalidArgument(format!("invalid name server address \"{}\"", s)))
}

fn loopback() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), NAMESERVER_PORT)
}

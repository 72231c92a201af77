//! Address, name, host info, mail exchanger and authority lookups.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::protocol::name::{MAX_LABEL_LEN, MAX_NAME_LEN};
use crate::protocol::record::{Answer, Entry, HostInfo, RecordType};
use crate::search::search;
use crate::transport::{Transport, UdpTransport};

const REVERSE_ZONE: &str = "in-addr.arpa";

/// A resolver session: its own configuration plus the transport used to
/// reach the name servers.
#[derive(Debug)]
pub struct Resolver<T = UdpTransport> {
    config: ResolverConfig,
    transport: T,
}

impl Resolver<UdpTransport> {
    pub fn new(config: ResolverConfig) -> Resolver<UdpTransport> {
        Resolver::with_transport(config, UdpTransport::new())
    }
}

impl<T: Transport> Resolver<T> {
    pub fn with_transport(config: ResolverConfig, transport: T) -> Resolver<T> {
        Resolver { config, transport }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ResolverConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Addresses of `name`. A literal address is looked up in reverse
    /// instead and its names are returned.
    pub fn address(&self, name: &str) -> Result<Vec<String>> {
        if is_literal_address(name) {
            return self.name(name);
        }
        validate_host_name(name)?;

        let answer = self.resolve(name, RecordType::A)?;
        Ok(answer.entries().iter().map(Entry::to_string).collect())
    }

    /// Names of the host with the given literal address.
    pub fn name(&self, address: &str) -> Result<Vec<String>> {
        let addr = validate_address(address)?;
        let answer = self.resolve(&reverse_name(addr), RecordType::PTR)?;
        Ok(answer.entries().iter().map(Entry::to_string).collect())
    }

    /// CPU and operating system of `name`.
    pub fn host_info(&self, name: &str) -> Result<HostInfo> {
        let name = self.host_name(name)?;
        let answer = self.resolve(&name, RecordType::HINFO)?;
        match answer.into_entries().into_iter().next() {
            Some(Entry::HostInfo(hinfo)) => Ok(hinfo),
            _ => Err(no_records(&name, RecordType::HINFO)),
        }
    }

    /// Mail exchangers of `name` as `"<exchange> <priority>"`.
    pub fn mail_exchangers(&self, name: &str) -> Result<Vec<String>> {
        let name = self.host_name(name)?;
        let answer = self.resolve(&name, RecordType::MX)?;
        Ok(answer.entries().iter().map(Entry::to_string).collect())
    }

    /// Primary name servers from the start of authority of `name`.
    pub fn authority(&self, name: &str) -> Result<Vec<String>> {
        let name = self.host_name(name)?;
        let answer = self.resolve(&name, RecordType::SOA)?;
        Ok(answer.entries().iter().map(Entry::to_string).collect())
    }

    //A literal address is turned into the first of its names first.
    fn host_name(&self, name: &str) -> Result<String> {
        let name = if is_literal_address(name) {
            self.name(name)
                .and_then(|names| {
                    debug!(address = name, names = ?names, "resolved literal address");
                    names
                        .into_iter()
                        .next()
                        .ok_or_else(|| no_records(name, RecordType::PTR))
                })
                .map_err(|e| Error::ReverseLookup {
                    address: name.to_string(),
                    source: Box::new(e),
                })?
        } else {
            name.to_string()
        };
        validate_host_name(&name)?;
        Ok(name)
    }

    fn resolve(&self, name: &str, record_type: RecordType) -> Result<Answer> {
        let answer = search(&self.transport, &self.config, name, record_type, 0)?;
        if !answer.answers(record_type) {
            return Err(no_records(name, record_type));
        }
        debug!(qname = name, %record_type, entries = answer.len(), "lookup answered");
        Ok(answer)
    }
}

fn no_records(name: &str, record_type: RecordType) -> Error {
    Error::NoRecords {
        name: name.to_string(),
        record_type,
    }
}

pub fn is_literal_address(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

pub fn validate_address(s: &str) -> Result<Ipv4Addr> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| Error::InvalidArgument(format!("invalid IP address \"{}\"", s)))
}

/// Checks host name syntax: dot separated labels of letters, digits,
/// '-' and '_', with no label starting or ending in '-'. A single trailing
/// dot is allowed.
pub fn validate_host_name(s: &str) -> Result<()> {
    let invalid = || Error::InvalidArgument(format!("invalid IP host name \"{}\"", s));

    let trimmed = s.strip_suffix('.').unwrap_or(s);
    if trimmed.is_empty() || trimmed.len() + 2 > MAX_NAME_LEN {
        return Err(invalid());
    }
    for label in trimmed.split('.') {
        let valid = !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(invalid());
        }
    }
    Ok(())
}

/// The PTR query name for `addr`, e.g. `4.3.2.1.in-addr.arpa`.
pub fn reverse_name(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{}.{}.{}.{}.{}", d, c, b, a, REVERSE_ZONE)
}

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use hickory_client::rr::{Name, RecordType};
use ipnet::IpNet;
use tracing::{debug, info, warn};

use crate::address_set::AddressSet;
use crate::dns_client::{Lookup, Resolve};
use crate::endpoints::parse_network;
use crate::error::VpnconfError;

/// One non-comment line of an extra routes file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteEntry {
    Literal(IpNet),
    Hostname(Name),
    Invalid(String),
}

impl RouteEntry {
    pub fn classify(line: &str) -> RouteEntry {
        let line = line.trim();
        if let Some(net) = parse_network(line) {
            return RouteEntry::Literal(net);
        }
        if is_hostname(line) {
            if let Ok(name) = Name::from_ascii(line) {
                return RouteEntry::Hostname(name);
            }
        }
        RouteEntry::Invalid(line.to_string())
    }
}

fn is_hostname(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 253
        && value
            .trim_end_matches('.')
            .split('.')
            .all(|label| {
                !label.is_empty()
                    && label.len() <= 63
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            })
}

/// Addresses gathered from extra routes files and the entries that yielded none.
#[derive(Debug, Default)]
pub struct ExtraRoutes {
    pub addresses: AddressSet,
    pub dns_errors: BTreeSet<String>,
}

/// Entries of a routes file, skipping blank and `#` comment lines.
pub fn read_entries(path: &Path) -> Result<Vec<String>, VpnconfError> {
    let file = File::open(path).map_err(|err| VpnconfError::file_access(path, err))?;
    io::BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|err| VpnconfError::file_access(path, err)))
        .filter(|line| match line {
            Ok(line) => !line.starts_with('#') && !line.trim().is_empty(),
            Err(_) => true,
        })
        .map(|line| line.map(|line| line.trim().to_string()))
        .collect()
}

pub async fn parse_extra_routes<R: Resolve + Sync>(
    files: &[PathBuf],
    resolver: &R,
) -> Result<ExtraRoutes, VpnconfError> {
    let mut extra = ExtraRoutes::default();
    for file in files {
        info!("reading extra routes from {}", file.display());
        for entry in read_entries(file)? {
            match RouteEntry::classify(&entry) {
                RouteEntry::Literal(net) => extra.addresses.insert(net),
                RouteEntry::Hostname(name) => {
                    let addresses = resolve_host(resolver, &name, file).await?;
                    if addresses.is_empty() {
                        extra.dns_errors.insert(entry);
                    }
                    for addr in addresses {
                        extra.addresses.insert_addr(addr);
                    }
                }
                RouteEntry::Invalid(line) => {
                    warn!("{:?} in {} is neither a network nor a hostname", line, file.display());
                    extra.dns_errors.insert(line);
                }
            }
        }
    }
    extra.addresses.compact();
    Ok(extra)
}

/// Resolves A then AAAA; an empty result means neither type had an address.
async fn resolve_host<R: Resolve + Sync>(
    resolver: &R,
    name: &Name,
    file: &Path,
) -> Result<Vec<IpAddr>, VpnconfError> {
    debug!("resolving hostname: {}", name);
    let mut addresses = Vec::new();
    let mut nx_domain = false;
    for query_type in [RecordType::A, RecordType::AAAA] {
        match resolver.lookup(name, query_type).await? {
            Lookup::Found(found) => addresses.extend(found),
            Lookup::NoAnswer => {
                debug!("no {} answer for {} in {}", query_type, name, file.display())
            }
            Lookup::NxDomain => {
                debug!(
                    "{} lookup for {} in {}: no such domain",
                    query_type,
                    name,
                    file.display()
                );
                nx_domain = true;
            }
        }
    }

    if addresses.is_empty() {
        if nx_domain {
            warn!("could not resolve hostname {} in {}", name, file.display());
        } else {
            warn!("could not resolve {} to either an IPv4 or IPv6 address", name);
        }
    }
    Ok(addresses)
}

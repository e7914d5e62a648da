use std::error::Error;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use hickory_client::client::{AsyncClient, ClientHandle};
use hickory_client::op::{DnsResponse, Message, ResponseCode};
use hickory_client::proto::iocompat::AsyncIoTokioAsStd;
use hickory_client::rr::{DNSClass, Name, RData, RecordType};
use hickory_client::tcp::TcpClientStream;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::system_conf::read_system_conf;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::VpnconfError;

/// Outcome of a single A or AAAA query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(Vec<IpAddr>),
    NoAnswer,
    NxDomain,
}

#[async_trait]
pub trait Resolve {
    async fn lookup(&self, name: &Name, record_type: RecordType) -> Result<Lookup, VpnconfError>;
}

/// Queries one nameserver over TCP.
///
/// Without an explicit upstream the first nameserver of the system resolver
/// configuration is used, read on every query.
pub struct DnsClient {
    upstream: Option<SocketAddr>,
}

impl DnsClient {
    pub fn new(upstream: Option<SocketAddr>) -> Self {
        DnsClient { upstream }
    }

    fn upstream(&self) -> Result<SocketAddr, VpnconfError> {
        if let Some(upstream) = self.upstream {
            return Ok(upstream);
        }
        let (config, _) =
            read_system_conf().map_err(|err| VpnconfError::ResolverConfig(err.to_string()))?;
        let upstream = first_nameserver(&config).ok_or_else(|| {
            VpnconfError::ResolverConfig("no nameservers configured".to_string())
        })?;
        debug!("using system nameserver {}", upstream);
        Ok(upstream)
    }

    async fn query(&self, name: Name, query_type: RecordType) -> Result<DnsResponse, VpnconfError> {
        let upstream = self.upstream()?;
        let (stream, sender) = TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::new(upstream);

        let (mut client, bg) = AsyncClient::new(stream, sender, None)
            .await
            .map_err(|err| dns_error(&name, err))?;

        tokio::spawn(bg);

        client
            .query(name.clone(), DNSClass::IN, query_type)
            .await
            .map_err(|err| dns_error(&name, err))
    }
}

fn first_nameserver(config: &ResolverConfig) -> Option<SocketAddr> {
    config
        .name_servers()
        .iter()
        .map(|name_server| name_server.socket_addr)
        .next()
}

fn dns_error(name: &Name, source: impl Into<Box<dyn Error + Send + Sync>>) -> VpnconfError {
    VpnconfError::Dns {
        name: name.to_string(),
        source: source.into(),
    }
}

#[async_trait]
impl Resolve for DnsClient {
    async fn lookup(&self, name: &Name, record_type: RecordType) -> Result<Lookup, VpnconfError> {
        let response = self.query(name.clone(), record_type).await?;
        lookup_outcome(name, record_type, &response)
    }
}

fn lookup_outcome(
    name: &Name,
    record_type: RecordType,
    message: &Message,
) -> Result<Lookup, VpnconfError> {
    match message.response_code() {
        ResponseCode::NoError => Ok(answer_addresses(message, record_type)),
        ResponseCode::NXDomain => Ok(Lookup::NxDomain),
        code => Err(VpnconfError::DnsResponse {
            name: name.to_string(),
            code,
        }),
    }
}

/// Addresses of the requested type in the answer section; CNAMEs are skipped.
fn answer_addresses(message: &Message, record_type: RecordType) -> Lookup {
    let addresses: Vec<IpAddr> = message
        .answers()
        .iter()
        .filter_map(|record| match (record_type, record.data()) {
            (RecordType::A, Some(RData::A(a))) => Some(IpAddr::V4(a.0)),
            (RecordType::AAAA, Some(RData::AAAA(aaaa))) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect();
    if addresses.is_empty() {
        Lookup::NoAnswer
    } else {
        Lookup::Found(addresses)
    }
}

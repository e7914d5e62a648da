use std::net::IpAddr;

use async_trait::async_trait;
use ipnet::IpNet;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::address_set::AddressSet;
use crate::error::VpnconfError;

pub const ENDPOINTS_URL: &str = "https://endpoints.office.com/endpoints";

/// Source of the published IP ranges of a cloud service instance.
#[async_trait]
pub trait EndpointSource {
    async fn endpoints(
        &self,
        instance: &str,
        request_id: Uuid,
    ) -> Result<AddressSet, VpnconfError>;
}

/// One service descriptor of the endpoint list.
#[derive(Deserialize, Debug, Default)]
pub struct ServiceEndpoint {
    #[serde(default)]
    pub ips: Vec<String>,
}

pub struct EndpointFetcher {
    client: Client,
}

impl EndpointFetcher {
    pub fn new() -> Result<Self, VpnconfError> {
        let client = Client::builder()
            .user_agent(format!("vpnconf/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(EndpointFetcher { client })
    }

    pub fn url(&self, instance: &str, request_id: Uuid) -> String {
        format!("{ENDPOINTS_URL}/{instance}?clientrequestid={request_id}")
    }
}

#[async_trait]
impl EndpointSource for EndpointFetcher {
    async fn endpoints(
        &self,
        instance: &str,
        request_id: Uuid,
    ) -> Result<AddressSet, VpnconfError> {
        info!("requesting endpoints for {}", instance);
        let url = self.url(instance, request_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(VpnconfError::Request(response.status()));
        }
        let body = response.text().await?;
        let services: Vec<ServiceEndpoint> = serde_json::from_str(&body)?;

        let addresses = collect_addresses(&services)?;
        info!(
            "gathered {} networks from {} services",
            addresses.cidrs().len(),
            services.len()
        );
        Ok(addresses)
    }
}

/// Folds the `ips` of every service into one compacted set.
///
/// Any entry that is not an address or CIDR fails the whole list.
pub fn collect_addresses(services: &[ServiceEndpoint]) -> Result<AddressSet, VpnconfError> {
    let mut addresses = AddressSet::new();
    for ip in services.iter().flat_map(|service| service.ips.iter()) {
        let net = parse_network(ip).ok_or_else(|| VpnconfError::MalformedEndpoint(ip.clone()))?;
        addresses.insert(net);
    }
    addresses.compact();
    Ok(addresses)
}

/// Parses a CIDR or a bare address.
pub fn parse_network(value: &str) -> Option<IpNet> {
    let value = value.trim();
    value
        .parse::<IpNet>()
        .ok()
        .or_else(|| value.parse::<IpAddr>().ok().map(IpNet::from))
}

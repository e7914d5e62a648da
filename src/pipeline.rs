use tracing::{error, info};
use uuid::Uuid;

use crate::config_file::{read_config_no_routes, write_config};
use crate::dns_client::Resolve;
use crate::endpoints::EndpointSource;
use crate::error::VpnconfError;
use crate::extra_routes::parse_extra_routes;
use crate::options::Settings;
use crate::routes::generate_routes;

pub struct Pipeline<E, R> {
    endpoints: E,
    resolver: R,
}

impl<E, R> Pipeline<E, R>
where
    E: EndpointSource + Sync,
    R: Resolve + Sync,
{
    pub fn new(endpoints: E, resolver: R) -> Self {
        Pipeline {
            endpoints,
            resolver,
        }
    }

    /// Builds the new configuration: existing lines without routes, then
    /// freshly generated routes. Nothing is written here.
    pub async fn build_config(&self, settings: &Settings) -> Result<Vec<String>, VpnconfError> {
        let mut lines = read_config_no_routes(&settings.source)?;

        let request_id = Uuid::new_v4();
        let addresses = self
            .endpoints
            .endpoints(&settings.instance, request_id)
            .await?;

        let extra = parse_extra_routes(&settings.extra_routes, &self.resolver).await?;
        if !extra.dns_errors.is_empty() {
            let unresolved: Vec<String> = extra.dns_errors.into_iter().collect();
            error!(
                "could not resolve the following hostnames: {}",
                unresolved.join(", ")
            );
            return Err(VpnconfError::Unresolved(unresolved));
        }

        let addresses = addresses.union(extra.addresses);
        let routes = generate_routes(&addresses, settings.no_ipv4, settings.no_ipv6);
        info!("generated {} routes", routes.len());
        lines.extend(routes);
        Ok(lines)
    }

    pub async fn run(&self, settings: &Settings) -> Result<(), VpnconfError> {
        let lines = self.build_config(settings).await?;
        write_config(&lines, &settings.destination)
    }
}

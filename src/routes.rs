use ipnet::IpNet;

use crate::address_set::AddressSet;

pub const ROUTE_PREFIX: &str = "route ";
pub const ROUTE_IPV6_PREFIX: &str = "route-ipv6 ";

/// Checks whether a configuration line is a route directive of either family.
pub fn is_route_line(line: &str) -> bool {
    line.starts_with(ROUTE_PREFIX) || line.starts_with(ROUTE_IPV6_PREFIX)
}

pub fn route_line(net: &IpNet) -> String {
    match net {
        IpNet::V4(net) => format!(
            "{ROUTE_PREFIX}{} {} vpn_gateway default",
            net.network(),
            net.netmask()
        ),
        IpNet::V6(net) => format!("{ROUTE_IPV6_PREFIX}{} default default", net.trunc()),
    }
}

/// Formats every block of the set as a route directive, in set order,
/// skipping blocks of a suppressed family.
pub fn generate_routes(addresses: &AddressSet, no_ipv4: bool, no_ipv6: bool) -> Vec<String> {
    addresses
        .cidrs()
        .iter()
        .filter(|net| match net {
            IpNet::V4(_) => !no_ipv4,
            IpNet::V6(_) => !no_ipv6,
        })
        .map(route_line)
        .collect()
}

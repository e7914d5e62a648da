use std::net::IpAddr;

use ipnet::IpNet;

/// A set of IPv4 and IPv6 networks.
///
/// Networks may be added in any shape; [`AddressSet::compact`] reduces them
/// to the minimal list of non-overlapping CIDR blocks covering the same
/// addresses, IPv4 blocks first, each family in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet {
    nets: Vec<IpNet>,
    compacted: bool,
}

impl AddressSet {
    pub fn new() -> Self {
        AddressSet::default()
    }

    pub fn insert(&mut self, net: IpNet) {
        self.nets.push(net);
        self.compacted = false;
    }

    pub fn insert_addr(&mut self, addr: IpAddr) {
        self.insert(IpNet::from(addr));
    }

    pub fn union(mut self, other: AddressSet) -> AddressSet {
        self.nets.extend(other.nets);
        self.compacted = false;
        self.compact();
        self
    }

    pub fn compact(&mut self) {
        if !self.compacted {
            self.nets = IpNet::aggregate(&self.nets);
            self.compacted = true;
        }
    }

    /// Minimal CIDR decomposition of the set.
    pub fn cidrs(&self) -> Vec<IpNet> {
        if self.compacted {
            self.nets.clone()
        } else {
            IpNet::aggregate(&self.nets)
        }
    }
}

impl FromIterator<IpNet> for AddressSet {
    fn from_iter<T: IntoIterator<Item = IpNet>>(iter: T) -> Self {
        let mut set = AddressSet::new();
        for net in iter {
            set.insert(net);
        }
        set
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ipnet::Ipv4Net;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    /// Networks inside 10.0.0.0/24 so coverage can be enumerated.
    fn small_net() -> impl Strategy<Value = IpNet> {
        (0u8..=255, 24u8..=32).prop_map(|(host, prefix)| {
            IpNet::V4(Ipv4Net::new(Ipv4Addr::new(10, 0, 0, host), prefix).unwrap().trunc())
        })
    }

    fn covered(nets: &[IpNet]) -> BTreeSet<u8> {
        (0u8..=255)
            .filter(|host| {
                let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, *host));
                nets.iter().any(|net| net.contains(&addr))
            })
            .collect()
    }

    proptest! {
        #[test]
        fn compaction_covers_exactly_the_union(
            left in prop::collection::vec(small_net(), 0..20),
            right in prop::collection::vec(small_net(), 0..20),
        ) {
            let mut inputs = left.clone();
            inputs.extend(right.iter().copied());

            let merged = left.into_iter().collect::<AddressSet>()
                .union(right.into_iter().collect());
            let cidrs = merged.cidrs();

            prop_assert_eq!(covered(&cidrs), covered(&inputs));
        }

        #[test]
        fn compaction_has_no_overlaps(nets in prop::collection::vec(small_net(), 0..40)) {
            let cidrs = nets.into_iter().collect::<AddressSet>().cidrs();
            for (i, a) in cidrs.iter().enumerate() {
                for b in cidrs.iter().skip(i + 1) {
                    prop_assert!(!a.contains(b) && !b.contains(a));
                }
            }
        }

        #[test]
        fn compaction_is_stable(nets in prop::collection::vec(small_net(), 0..40)) {
            let mut set = nets.into_iter().collect::<AddressSet>();
            set.compact();
            let once = set.cidrs();
            let twice = once.iter().copied().collect::<AddressSet>().cidrs();
            prop_assert_eq!(once, twice);
        }
    }
}

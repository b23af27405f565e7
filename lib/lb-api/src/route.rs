//! Routing fabric vocabulary: destinations, next hops and VNIs

use ipnetwork::{IpNetwork, Ipv6Network};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

/// Virtual network identifier partitioning the fabric's route namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vni(pub u32);

impl fmt::Display for Vni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Vni {
    fn from(value: u32) -> Self {
        Vni(value)
    }
}

/// Address family of a destination prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

/// Destination prefix of a route
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    pub ip_version: IpVersion,
    pub prefix: IpNetwork,
}

impl Destination {
    /// Single-host /128 route for an IPv6 address
    pub fn host(address: Ipv6Addr) -> Self {
        Self {
            ip_version: IpVersion::V6,
            prefix: IpNetwork::V6(Ipv6Network::from(address)),
        }
    }

    /// Whether the prefix covers exactly one address
    pub fn is_host_route(&self) -> bool {
        match self.prefix {
            IpNetwork::V4(net) => net.prefix() == 32,
            IpNetwork::V6(net) => net.prefix() == 128,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)
    }
}

/// Kind of next hop understood by the fabric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NextHopType {
    Standard,
    Nat,
    LoadBalancerTarget,
}

impl fmt::Display for NextHopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NextHopType::Standard => "STANDARD",
            NextHopType::Nat => "NAT",
            NextHopType::LoadBalancerTarget => "LOADBALANCER_TARGET",
        };
        f.write_str(name)
    }
}

/// Where traffic for a destination is sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NextHop {
    pub target_address: IpAddr,
    pub target_vni: Vni,
    pub hop_type: NextHopType,
}

impl NextHop {
    /// Standard next hop pointing at a node
    pub fn standard(target_address: IpAddr, target_vni: Vni) -> Self {
        Self {
            target_address,
            target_vni,
            hop_type: NextHopType::Standard,
        }
    }
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (vni {}, {})",
            self.target_address, self.target_vni, self.hop_type
        )
    }
}

/// A (destination, next hop) pair within one VNI
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    pub vni: Vni,
    pub destination: Destination,
    pub next_hop: NextHop,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vni {}: {} via {}", self.vni, self.destination, self.next_hop)
    }
}

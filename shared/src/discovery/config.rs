use std::{
    default::Default,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

/// Contains Config properties which will be used to find or advertise a session
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Fixed literal that prefixes every advertisement. Advertisements with
    /// any other tag belong to another application and are ignored.
    pub protocol_tag: String,
    /// How long discovery waits on the proximity channel alone before the
    /// LAN broadcast fallback is started
    pub lan_fallback_after: Duration,
    /// Port hosts listen on for LAN discovery requests
    pub lan_port: u16,
    /// Delay between two LAN discovery requests
    pub lan_request_interval: Duration,
    /// Destination of LAN discovery requests
    pub lan_broadcast_ip: IpAddr,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            protocol_tag: "SharedSpatialAnchorSession".to_string(),
            lan_fallback_after: Duration::from_secs(10),
            lan_port: 47777,
            lan_request_interval: Duration::from_secs(1),
            lan_broadcast_ip: IpAddr::V4(Ipv4Addr::BROADCAST),
        }
    }
}

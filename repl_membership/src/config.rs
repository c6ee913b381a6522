use std::net::IpAddr;
use std::time::Duration;

/// Per-node membership configuration (§6 "Startup configuration").
#[derive(Debug, Clone)]
pub struct MembershipConfig {
    pub name: String,
    pub bind_addr: IpAddr,
    pub gossip_port: u16,
    /// Empty for the bootstrap node; otherwise `host:port` of any node
    /// already in the cluster.
    pub seed_peer_addr: Option<String>,
    pub push_pull_interval: Duration,
}

impl MembershipConfig {
    pub fn gossip_bind(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind_addr, self.gossip_port)
    }
}

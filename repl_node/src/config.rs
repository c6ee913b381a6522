//! Startup configuration (§6 "Startup configuration"), loaded from TOML the
//! way `s5_cli` loads `S5NodeConfig`, with CLI flags from the binary
//! overriding individual fields after the file is parsed.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NodeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub region_id: u32,
    pub number_of_regions: u32,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_gossip_port")]
    pub gossip_port: u16,
    /// Empty/absent for the bootstrap node.
    #[serde(default)]
    pub seed_peer_addr: Option<String>,
    #[serde(default = "default_push_pull_interval_secs")]
    pub push_pull_interval_secs: u64,
}

fn default_bind_addr() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_api_port() -> u16 {
    8080
}

fn default_gossip_port() -> u16 {
    7946
}

fn default_push_pull_interval_secs() -> u64 {
    1
}

impl NodeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(contents).map_err(NodeError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    /// `R = 0` is undefined per §8 "Boundary behaviors" and must be rejected
    /// at construction rather than produce a merge engine that can never
    /// reach quorum.
    fn validate(&self) -> Result<(), NodeError> {
        if self.number_of_regions == 0 {
            return Err(NodeError::InvalidRegionCount);
        }
        if self.region_id >= self.number_of_regions {
            return Err(NodeError::RegionOutOfRange {
                region_id: self.region_id,
                number_of_regions: self.number_of_regions,
            });
        }
        Ok(())
    }

    pub fn push_pull_interval(&self) -> Duration {
        Duration::from_secs(self.push_pull_interval_secs)
    }

    pub fn api_bind(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind_addr, self.api_port)
    }
}

//! Controller configuration from the environment

use lb_runtime::config::{self, invalid, optional, ConfigError, Lookup};
use lb_runtime::ControllerSettings;
use std::net::SocketAddr;

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Prefix length of the pod CIDR assigned to each node
    pub node_cidr_mask_size: u8,
    pub controller: ControllerSettings,
    pub metrics_addr: SocketAddr,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&config::env)
    }

    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let node_cidr_mask_size: u8 = optional(lookup, "NODE_CIDR_MASK_SIZE", 64)?;
        if node_cidr_mask_size > 128 {
            return Err(invalid(
                "NODE_CIDR_MASK_SIZE",
                node_cidr_mask_size,
                "must be between 0 and 128",
            ));
        }

        Ok(Self {
            node_cidr_mask_size,
            controller: ControllerSettings::from_lookup(lookup)?,
            metrics_addr: config::metrics_addr(lookup)?,
        })
    }
}

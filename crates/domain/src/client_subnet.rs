use crate::errors::CacheError;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Client subnet attached to a query when subnet-aware caching is enabled.
///
/// The address is stored masked to the prefix, so every client inside the
/// same subnet produces identical key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSubnet {
    network: IpNetwork,
}

impl ClientSubnet {
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, CacheError> {
        let network = IpNetwork::new(addr, prefix)
            .map_err(|e| CacheError::InvalidClientSubnet(e.to_string()))?;
        // Rebuild from the masked network address to drop host bits.
        let network = IpNetwork::new(network.network(), prefix)
            .map_err(|e| CacheError::InvalidClientSubnet(e.to_string()))?;
        Ok(Self { network })
    }

    pub fn network(&self) -> IpNetwork {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Key material: prefix length followed by the masked address octets.
    pub fn key_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(17);
        buf.push(self.network.prefix());
        match self.network.network() {
            IpAddr::V4(v4) => buf.extend_from_slice(&v4.octets()),
            IpAddr::V6(v6) => buf.extend_from_slice(&v6.octets()),
        }
        buf
    }
}

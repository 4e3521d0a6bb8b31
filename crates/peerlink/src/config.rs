//! PeerLink configuration.

use peerlink_channel::ChannelConfig;

/// Configuration for a [`LinkManager`](crate::LinkManager).
#[derive(Debug, Clone)]
pub struct PeerLinkConfig {
    /// Applied to every attached data channel.
    pub channel: ChannelConfig,
    /// Capacity of the merged inbound message stream.
    pub inbound_capacity: usize,
}

impl Default for PeerLinkConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            inbound_capacity: 100,
        }
    }
}

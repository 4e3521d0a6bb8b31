//! Channel configuration.

use std::time::Duration;

use peerlink_core::CHUNK_SIZE;

/// Configuration for a [`DataChannelClient`](crate::DataChannelClient).
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Outgoing chunk payload size. Peers must agree, so leave at the default.
    pub chunk_size: usize,
    /// How long `send_message_confirmed` waits for the peer's receipt.
    pub receipt_timeout: Duration,
    /// Partial inbound messages idle for longer than this are discarded.
    pub idle_timeout: Duration,
    /// How often the receive loop sweeps for idle partial messages.
    pub sweep_interval: Duration,
    /// Maximum number of inbound message IDs buffered at once.
    pub max_pending_messages: usize,
    /// Maximum chunks held for one inbound message. Larger messages are refused.
    pub max_chunks_per_message: usize,
    /// Hashes of delivered messages remembered to suppress re-delivery. Zero disables.
    pub delivered_history: usize,
    /// Capacity of the outgoing message and receipt streams.
    pub stream_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            receipt_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(10),
            max_pending_messages: 64,
            max_chunks_per_message: 1024,
            delivered_history: 64,
            stream_capacity: 100,
        }
    }
}

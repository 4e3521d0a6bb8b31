//! Error types for PeerLink.

use peerlink_channel::ChannelError;
use peerlink_core::{ConnectionPassword, CoreError};
use thiserror::Error;

/// Errors that can occur during PeerLink operations.
#[derive(Debug, Error)]
pub enum PeerLinkError {
    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Serialization of an outgoing payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No link with this password is known.
    #[error("unknown link: {0}")]
    UnknownLink(ConnectionPassword),

    /// The link is known but has no data channel attached.
    #[error("link not connected: {0}")]
    NotConnected(ConnectionPassword),
}

/// Result type for PeerLink operations.
pub type Result<T> = std::result::Result<T, PeerLinkError>;

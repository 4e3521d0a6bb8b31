//! Error types for the channel module.

use thiserror::Error;

use peerlink_core::{MessageId, ReceiveErrorReason};

/// Errors that can occur on a data channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Encoding or another core precondition failed.
    #[error("core error: {0}")]
    Core(#[from] peerlink_core::CoreError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The channel or its client was closed.
    #[error("data channel closed")]
    Closed,

    /// No receipt arrived in time.
    #[error("timeout waiting for receipt of message {0}")]
    Timeout(MessageId),

    /// The peer answered with an error receipt.
    #[error("peer rejected message {message_id}: {reason:?}")]
    Rejected {
        message_id: MessageId,
        reason: ReceiveErrorReason,
    },
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

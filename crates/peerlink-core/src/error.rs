//! Error types for PeerLink Core.

use thiserror::Error;

use crate::crypto::{MessageHash, Sha256Hash};
use crate::message::{ReceiveError, ReceiveErrorReason};
use crate::types::MessageId;

/// Result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors: cryptographic preconditions, encodings, wire decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid connection password: {0}")]
    InvalidConnectionPassword(String),

    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("curve25519 only supports hardened derivation (index {0})")]
    NonHardenedCurve25519(u32),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::DecodingError(e.to_string())
    }
}

/// Reassembly failures.
///
/// Each variant is a local diagnostic. On the wire all of them collapse to a
/// single [`ReceiveErrorReason::MessageHashesMismatch`], see
/// [`AssembleError::to_receive_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("no chunk packages for message {message_id}")]
    NoPackages { message_id: MessageId },

    #[error("chunk indices of message {message_id} are not 0..{expected_count}")]
    IncorrectIndices {
        message_id: MessageId,
        expected_count: usize,
    },

    #[error("chunk for message {chunk_message_id} supplied while assembling {message_id}")]
    ForeignChunk {
        message_id: MessageId,
        chunk_message_id: MessageId,
    },

    #[error("byte count mismatch for message {message_id}: got {got}, stated {stated}")]
    ByteCountMismatch {
        message_id: MessageId,
        got: usize,
        stated: usize,
    },

    #[error("hash mismatch for message {message_id}: calculated {calculated}, expected {expected}")]
    HashMismatch {
        message_id: MessageId,
        calculated: Sha256Hash,
        expected: MessageHash,
    },
}

impl AssembleError {
    /// The message the failure refers to.
    pub fn message_id(&self) -> &MessageId {
        match self {
            AssembleError::NoPackages { message_id }
            | AssembleError::IncorrectIndices { message_id, .. }
            | AssembleError::ForeignChunk { message_id, .. }
            | AssembleError::ByteCountMismatch { message_id, .. }
            | AssembleError::HashMismatch { message_id, .. } => message_id,
        }
    }

    /// The error receipt to send back to the peer.
    pub fn to_receive_error(&self) -> ReceiveError {
        ReceiveError {
            message_id: self.message_id().clone(),
            error: ReceiveErrorReason::MessageHashesMismatch,
        }
    }
}

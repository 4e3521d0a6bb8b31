//! # PeerLink Core
//!
//! Pure primitives for the PeerLink data channel: SLIP10 keys and signatures,
//! the wire envelope, chunk splitting and reassembly, and link identity.
//!
//! This crate contains no I/O, no timers, no networking. It is pure computation
//! over byte buffers and cryptographic values.
//!
//! ## Key Types
//!
//! - [`DataChannelMessage`] - The unit that crosses the wire (chunk, metadata or receipt)
//! - [`AssembledMessage`] - A complete logical message with its SHA-256 hash
//! - [`MessageId`] - Correlates the packets and receipts of one logical message
//! - [`ConnectionPassword`] / [`P2PLink`] - Identity of a paired peer
//! - [`PrivateKey`] / [`PublicKey`] / [`Signature`] - Curve25519 or secp256k1
//!
//! ## Wire Format
//!
//! Packets are flat JSON objects discriminated by `packageType`. See [`message`].

pub mod assembler;
pub mod crypto;
pub mod error;
pub mod hd;
pub mod link;
pub mod message;
pub mod slip10;
pub mod types;

pub use assembler::{split, split_with_chunk_size, AssembledMessage, CHUNK_SIZE};
pub use crypto::{sha256, sha256_twice, MessageHash, Sha256Hash};
pub use error::{AssembleError, CoreError, Result};
pub use hd::{ExtendedKey, HdPath, HdPathComponent};
pub use link::{ConnectionPassword, P2PLink, P2PLinks};
pub use message::{
    ChunkPackage, ChunkedMessage, DataChannelMessage, MetaDataPackage, ReceiveConfirmation,
    ReceiveError, ReceiveErrorReason, Receipt,
};
pub use slip10::{
    Curve, PrivateKey, PublicKey, RecoverableSignature, SignOutput, Signature,
    SignatureWithPublicKey,
};
pub use types::MessageId;

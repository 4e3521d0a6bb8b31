//! # PeerLink
//!
//! The unified API for PeerLink: chunked, hash-verified messaging between a
//! wallet and paired dApp connectors, plus validation of the dApp requests
//! that travel over it.
//!
//! ## Overview
//!
//! - **Links**: a [`P2PLink`] is a paired peer identified by its connection password
//! - **Channels**: each attached link gets a [`DataChannelClient`] that splits, reassembles and acknowledges messages
//! - **Requests**: reassembled messages decode into dApp requests, validated by [`RequestValidator`]
//! - **Keys**: [`PrivateKey`] / [`PublicKey`] sign and verify on Curve25519 or secp256k1
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peerlink::{ConnectionPassword, LinkManager, P2PLink, PeerLinkConfig};
//! use peerlink::channel::MemoryChannel;
//! use tokio_stream::StreamExt;
//!
//! async fn example() -> peerlink::Result<()> {
//!     let (manager, mut inbound) = LinkManager::new(PeerLinkConfig::default());
//!
//!     let password = ConnectionPassword::from_bytes([0xde; 32]);
//!     manager.add_link(P2PLink::new(password, "Chrome")).await;
//!
//!     // In production the channel is a WebRTC data channel.
//!     let (channel, _peer) = MemoryChannel::pair();
//!     manager.attach(&password, Arc::new(channel)).await?;
//!
//!     while let Some(routed) = inbound.next().await {
//!         let _request = routed.to_request();
//!         // validate, then answer with manager.send_json(..)
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `peerlink::core` - Keys, envelope codec, chunk assembler, links
//! - `peerlink::channel` - Data channel transport and client
//! - `peerlink::dapp` - dApp request model and validation

pub mod config;
pub mod error;
pub mod manager;

// Re-export component crates
pub use peerlink_channel as channel;
pub use peerlink_core as core;
pub use peerlink_dapp as dapp;

// Re-export main types for convenience
pub use config::PeerLinkConfig;
pub use error::{PeerLinkError, Result};
pub use manager::{LinkManager, RoutedMessage};

// Re-export commonly used component types
pub use peerlink_channel::{ChannelConfig, DataChannel, DataChannelClient};
pub use peerlink_core::{
    AssembledMessage, ConnectionPassword, MessageId, P2PLink, P2PLinks, PrivateKey, PublicKey,
    Signature,
};
pub use peerlink_dapp::{
    IncomingRequest, RequestValidator, ValidatedRequest, WalletContext,
    WalletInteractionFailureResponse,
};

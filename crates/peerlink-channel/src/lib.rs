//! # PeerLink Channel
//!
//! Per-connection data channel client.
//!
//! ## Overview
//!
//! A [`DataChannelClient`] owns one [`DataChannel`] transport. Outgoing
//! messages are split into a metadata packet plus chunk packets. Incoming
//! packets are buffered per message ID until complete, verified, surfaced on
//! [`ChannelStreams::messages`] and acknowledged with a receipt.
//!
//! ## Key Properties
//!
//! - **Order tolerant**: chunks may arrive in any order, interleaved across messages
//! - **Verified**: only messages whose SHA-256 matches their metadata are surfaced
//! - **Isolated**: each connection owns its reassembly buffer; teardown discards it
//! - **Bounded**: idle partial messages expire and the number of pending IDs is capped
//!
//! ## Message Flow
//!
//! ```text
//! Sender                               Receiver
//!   |-------- metaData --------------->|
//!   |-------- chunk 0 ---------------->|
//!   |-------- chunk 1 ---------------->|   reassemble + verify
//!   |<------- receiveMessageConfirmation
//!   |         (or receiveMessageError) |
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peerlink_channel::{ChannelConfig, DataChannelClient, MemoryChannel};
//! use tokio_stream::StreamExt;
//!
//! async fn example() -> peerlink_channel::Result<()> {
//!     let (a, b) = MemoryChannel::pair();
//!     let (alice, _) = DataChannelClient::spawn(Arc::new(a), ChannelConfig::default());
//!     let (_bob, mut bob_streams) = DataChannelClient::spawn(Arc::new(b), ChannelConfig::default());
//!
//!     alice.send_message_confirmed(&b"hello"[..]).await?;
//!     let message = bob_streams.messages.next().await;
//!     assert!(message.is_some());
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod transport;

pub use buffer::ReassemblyBuffer;
pub use client::{ChannelStreams, DataChannelClient, IdGenerator, ReceiptEvent};
pub use config::ChannelConfig;
pub use dedup::DeliveredHistory;
pub use error::{ChannelError, Result};
pub use transport::{memory::MemoryChannel, DataChannel};

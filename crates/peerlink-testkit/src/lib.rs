//! # PeerLink Testkit
//!
//! Testing utilities for PeerLink.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known packets and keys with their exact encodings
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Connected client pairs, a configurable wallet context, sample requests
//!
//! ## Golden Vectors
//!
//! ```rust
//! use peerlink_testkit::vectors::wire_vectors;
//!
//! for vector in wire_vectors() {
//!     let encoded = vector.message.encode().unwrap();
//!     println!("{}: {}", vector.name, String::from_utf8_lossy(&encoded));
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use peerlink_testkit::generators::MessageParams;
//!
//! proptest! {
//!     #[test]
//!     fn split_is_deterministic(params: MessageParams) {
//!         prop_assert_eq!(params.packets(), params.packets());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{ConnectedPair, TestWallet};
pub use generators::{shuffled_packets, MessageParams};
pub use vectors::{key_vectors, verify_key_vectors, wire_vectors, KeyVector, WireVector};

//! Transport abstraction for the data channel.
//!
//! The transport moves opaque packets. Implementations may wrap a WebRTC data
//! channel, a WebSocket, or anything else that preserves packet boundaries.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A packet-oriented, bidirectional byte channel.
///
/// Implementations must be thread-safe (Send + Sync). Only one task calls
/// `recv` at a time; `send` may be called concurrently.
#[async_trait]
pub trait DataChannel: Send + Sync {
    /// Send one packet.
    async fn send(&self, packet: Bytes) -> Result<()>;

    /// Receive the next packet.
    ///
    /// Returns `None` once the peer has closed the channel.
    async fn recv(&self) -> Result<Option<Bytes>>;

    /// Close the sending side. The peer sees end of stream.
    async fn close(&self) -> Result<()>;
}

/// An in-memory channel pair for testing.
pub mod memory {
    use super::*;
    use crate::error::ChannelError;
    use tokio::sync::{mpsc, Mutex, RwLock};

    /// One end of an in-memory data channel.
    pub struct MemoryChannel {
        sender: RwLock<Option<mpsc::Sender<Bytes>>>,
        receiver: Mutex<mpsc::Receiver<Bytes>>,
    }

    impl MemoryChannel {
        /// Create two connected ends.
        pub fn pair() -> (Self, Self) {
            Self::pair_with_capacity(1000)
        }

        /// Create two connected ends with bounded buffers.
        pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
            let (a_tx, a_rx) = mpsc::channel(capacity);
            let (b_tx, b_rx) = mpsc::channel(capacity);
            (
                Self {
                    sender: RwLock::new(Some(a_tx)),
                    receiver: Mutex::new(b_rx),
                },
                Self {
                    sender: RwLock::new(Some(b_tx)),
                    receiver: Mutex::new(a_rx),
                },
            )
        }
    }

    #[async_trait]
    impl DataChannel for MemoryChannel {
        async fn send(&self, packet: Bytes) -> Result<()> {
            let sender = self.sender.read().await;
            match sender.as_ref() {
                Some(tx) => tx
                    .send(packet)
                    .await
                    .map_err(|_| ChannelError::TransportError("peer disconnected".into())),
                None => Err(ChannelError::Closed),
            }
        }

        async fn recv(&self) -> Result<Option<Bytes>> {
            let mut rx = self.receiver.lock().await;
            Ok(rx.recv().await)
        }

        async fn close(&self) -> Result<()> {
            self.sender.write().await.take();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryChannel;
    use super::*;
    use crate::error::ChannelError;

    #[tokio::test]
    async fn test_memory_channel_send_recv() {
        let (a, b) = MemoryChannel::pair();

        a.send(Bytes::from_static(b"ping")).await.unwrap();
        b.send(Bytes::from_static(b"pong")).await.unwrap();

        assert_eq!(b.recv().await.unwrap(), Some(Bytes::from_static(b"ping")));
        assert_eq!(a.recv().await.unwrap(), Some(Bytes::from_static(b"pong")));
    }

    #[tokio::test]
    async fn test_memory_channel_close() {
        let (a, b) = MemoryChannel::pair();

        a.send(Bytes::from_static(b"last")).await.unwrap();
        a.close().await.unwrap();

        assert!(matches!(
            a.send(Bytes::from_static(b"more")).await,
            Err(ChannelError::Closed)
        ));
        assert_eq!(b.recv().await.unwrap(), Some(Bytes::from_static(b"last")));
        assert_eq!(b.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_channel_peer_dropped() {
        let (a, b) = MemoryChannel::pair();
        drop(b);
        assert!(matches!(
            a.send(Bytes::from_static(b"x")).await,
            Err(ChannelError::TransportError(_))
        ));
    }
}

//! The LinkManager: paired links and their live data channels.
//!
//! The manager owns the [`P2PLinks`] collection (shared with settings UI
//! behind a single `RwLock`) and one [`DataChannelClient`] per attached link.
//! Messages from every attached channel are merged into one stream, tagged
//! with the link they arrived on.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use peerlink_channel::{ChannelStreams, DataChannel, DataChannelClient};
use peerlink_core::{AssembledMessage, ConnectionPassword, MessageId, P2PLink, P2PLinks};
use peerlink_dapp::{IncomingRequest, Route};

use crate::config::PeerLinkConfig;
use crate::error::{PeerLinkError, Result};

/// A verified inbound message and the link it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedMessage {
    pub connection_password: ConnectionPassword,
    pub message: AssembledMessage,
}

impl RoutedMessage {
    pub fn route(&self) -> Route {
        Route::Rtc {
            connection_password: self.connection_password,
            message_id: self.message.id_of_chunks().clone(),
        }
    }

    /// Decode the message as a dApp request, ready for validation.
    pub fn to_request(&self) -> IncomingRequest {
        IncomingRequest::from_message(self.route(), &self.message)
    }
}

struct AttachedLink {
    client: Arc<DataChannelClient>,
    forwarder: JoinHandle<()>,
}

/// Manages paired links and their data channels.
pub struct LinkManager {
    links: Arc<RwLock<P2PLinks>>,
    attached: Mutex<HashMap<ConnectionPassword, AttachedLink>>,
    inbound_tx: mpsc::Sender<RoutedMessage>,
    config: PeerLinkConfig,
}

impl LinkManager {
    /// Create a manager with no links.
    pub fn new(config: PeerLinkConfig) -> (Self, ReceiverStream<RoutedMessage>) {
        Self::with_links(P2PLinks::new(), config)
    }

    /// Create a manager over previously saved links.
    ///
    /// Returns the merged stream of inbound messages from all attached links.
    pub fn with_links(
        links: P2PLinks,
        config: PeerLinkConfig,
    ) -> (Self, ReceiverStream<RoutedMessage>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let manager = Self {
            links: Arc::new(RwLock::new(links)),
            attached: Mutex::new(HashMap::new()),
            inbound_tx,
            config,
        };
        (manager, ReceiverStream::new(inbound_rx))
    }

    /// The link collection, for readers and writers outside the manager.
    pub fn shared_links(&self) -> Arc<RwLock<P2PLinks>> {
        Arc::clone(&self.links)
    }

    /// Snapshot of the current links.
    pub async fn links(&self) -> P2PLinks {
        self.links.read().await.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a link. Returns `false` if one with the same password exists.
    pub async fn add_link(&self, link: P2PLink) -> bool {
        let password = link.connection_password;
        let added = self.links.write().await.append(link).is_some();
        if added {
            tracing::info!(link = %password, "link added");
        }
        added
    }

    /// Remove a link, closing its data channel if one is attached.
    pub async fn remove_link(&self, password: &ConnectionPassword) -> Result<Option<P2PLink>> {
        let removed = self.links.write().await.remove(password);
        if removed.is_some() {
            tracing::info!(link = %password, "link removed");
        }
        self.detach(password).await?;
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channel Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a data channel client for a known link.
    ///
    /// A channel already attached to the link is closed and replaced.
    pub async fn attach(
        &self,
        password: &ConnectionPassword,
        channel: Arc<dyn DataChannel>,
    ) -> Result<()> {
        // Lock order is `attached` then `links`; `remove_link` cannot slip
        // between the check and the insert.
        let previous = {
            let mut attached = self.attached.lock().await;
            if !self.links.read().await.contains(password) {
                return Err(PeerLinkError::UnknownLink(*password));
            }

            let (client, streams) = DataChannelClient::spawn(channel, self.config.channel.clone());
            let forwarder = tokio::spawn(forward(*password, streams, self.inbound_tx.clone()));
            attached.insert(
                *password,
                AttachedLink {
                    client: Arc::new(client),
                    forwarder,
                },
            )
        };
        tracing::info!(link = %password, "data channel attached");

        if let Some(previous) = previous {
            if let Err(e) = close_attached(previous).await {
                tracing::warn!(link = %password, error = %e, "failed to close replaced data channel");
            }
        }
        Ok(())
    }

    /// Close and forget the data channel of a link.
    ///
    /// Returns `false` if nothing was attached.
    pub async fn detach(&self, password: &ConnectionPassword) -> Result<bool> {
        let Some(attached) = self.attached.lock().await.remove(password) else {
            return Ok(false);
        };
        close_attached(attached).await?;
        tracing::info!(link = %password, "data channel detached");
        Ok(true)
    }

    /// Whether a running data channel is attached to the link.
    pub async fn is_connected(&self, password: &ConnectionPassword) -> bool {
        self.attached
            .lock()
            .await
            .get(password)
            .map(|a| a.client.is_running())
            .unwrap_or(false)
    }

    /// Send a message on a link's data channel.
    pub async fn send_message(
        &self,
        password: &ConnectionPassword,
        content: impl Into<Bytes>,
    ) -> Result<MessageId> {
        let client = self.client(password).await?;
        Ok(client.send_message(content).await?)
    }

    /// Send a message and wait for the peer's receipt.
    pub async fn send_message_confirmed(
        &self,
        password: &ConnectionPassword,
        content: impl Into<Bytes>,
    ) -> Result<MessageId> {
        let client = self.client(password).await?;
        Ok(client.send_message_confirmed(content).await?)
    }

    /// Serialize `value` as JSON and send it with confirmation.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        password: &ConnectionPassword,
        value: &T,
    ) -> Result<MessageId> {
        let content = serde_json::to_vec(value)?;
        self.send_message_confirmed(password, content).await
    }

    /// Close every attached data channel. Links are kept.
    pub async fn shutdown(&self) {
        let attached: Vec<_> = self.attached.lock().await.drain().collect();
        for (password, link) in attached {
            if let Err(e) = close_attached(link).await {
                tracing::warn!(link = %password, error = %e, "failed to close data channel");
            }
        }
    }

    async fn client(&self, password: &ConnectionPassword) -> Result<Arc<DataChannelClient>> {
        let attached = self.attached.lock().await;
        match attached.get(password) {
            Some(link) => Ok(Arc::clone(&link.client)),
            None if self.links.read().await.contains(password) => {
                Err(PeerLinkError::NotConnected(*password))
            }
            None => Err(PeerLinkError::UnknownLink(*password)),
        }
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        for link in self.attached.get_mut().values() {
            link.forwarder.abort();
        }
    }
}

async fn close_attached(link: AttachedLink) -> Result<()> {
    link.forwarder.abort();
    link.client.close().await?;
    Ok(())
}

/// Move one client's messages into the merged stream until either side ends.
async fn forward(
    password: ConnectionPassword,
    mut streams: ChannelStreams,
    inbound_tx: mpsc::Sender<RoutedMessage>,
) {
    loop {
        tokio::select! {
            message = streams.messages.next() => {
                let Some(message) = message else { break };
                let routed = RoutedMessage {
                    connection_password: password,
                    message,
                };
                if inbound_tx.send(routed).await.is_err() {
                    break;
                }
            }
            Some(event) = streams.receipts.next() => {
                tracing::trace!(link = %password, event = ?event, "receipt");
            }
        }
    }
    tracing::debug!(link = %password, "data channel ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_channel::MemoryChannel;

    fn password(byte: u8) -> ConnectionPassword {
        ConnectionPassword::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_add_and_remove_links() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());

        assert!(manager.add_link(P2PLink::new(password(1), "Chrome")).await);
        assert!(!manager.add_link(P2PLink::new(password(1), "Again")).await);
        assert!(manager.add_link(P2PLink::new(password(2), "Firefox")).await);
        assert_eq!(manager.links().await.len(), 2);

        let removed = manager.remove_link(&password(1)).await.unwrap();
        assert_eq!(removed.unwrap().display_name, "Chrome");
        assert!(manager.remove_link(&password(1)).await.unwrap().is_none());
        assert_eq!(manager.links().await.len(), 1);
    }

    #[tokio::test]
    async fn test_shared_links_visible_to_manager() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        let shared = manager.shared_links();
        shared.write().await.append(P2PLink::new(password(3), "Edge"));

        assert!(manager.links().await.contains(&password(3)));
    }

    #[tokio::test]
    async fn test_attach_requires_known_link() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        let (a, _b) = MemoryChannel::pair();

        let err = manager.attach(&password(1), Arc::new(a)).await.unwrap_err();
        assert!(matches!(err, PeerLinkError::UnknownLink(_)));
    }

    #[tokio::test]
    async fn test_send_without_channel() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        manager.add_link(P2PLink::new(password(1), "Chrome")).await;

        let err = manager.send_message(&password(1), &b"x"[..]).await.unwrap_err();
        assert!(matches!(err, PeerLinkError::NotConnected(_)));

        let err = manager.send_message(&password(2), &b"x"[..]).await.unwrap_err();
        assert!(matches!(err, PeerLinkError::UnknownLink(_)));
    }

    #[tokio::test]
    async fn test_messages_routed_by_link() {
        let (wallet, mut inbound) = LinkManager::new(PeerLinkConfig::default());
        let (dapp, _dapp_inbound) = LinkManager::new(PeerLinkConfig::default());

        for manager in [&wallet, &dapp] {
            manager.add_link(P2PLink::new(password(1), "one")).await;
            manager.add_link(P2PLink::new(password(2), "two")).await;
        }
        for p in [password(1), password(2)] {
            let (a, b) = MemoryChannel::pair();
            wallet.attach(&p, Arc::new(a)).await.unwrap();
            dapp.attach(&p, Arc::new(b)).await.unwrap();
        }

        dapp.send_message_confirmed(&password(2), &b"to two"[..]).await.unwrap();
        let routed = inbound.next().await.unwrap();
        assert_eq!(routed.connection_password, password(2));
        assert_eq!(routed.message.message_content().as_ref(), b"to two");

        dapp.send_message_confirmed(&password(1), &b"to one"[..]).await.unwrap();
        let routed = inbound.next().await.unwrap();
        assert_eq!(routed.connection_password, password(1));
        assert!(matches!(routed.route(), Route::Rtc { .. }));
    }

    #[tokio::test]
    async fn test_remove_link_closes_channel() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        manager.add_link(P2PLink::new(password(1), "Chrome")).await;
        let (a, b) = MemoryChannel::pair();
        manager.attach(&password(1), Arc::new(a)).await.unwrap();
        assert!(manager.is_connected(&password(1)).await);

        manager.remove_link(&password(1)).await.unwrap();
        assert!(!manager.is_connected(&password(1)).await);
        assert_eq!(b.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reattach_replaces_channel() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        manager.add_link(P2PLink::new(password(1), "Chrome")).await;

        let (a1, b1) = MemoryChannel::pair();
        manager.attach(&password(1), Arc::new(a1)).await.unwrap();
        let (a2, _b2) = MemoryChannel::pair();
        manager.attach(&password(1), Arc::new(a2)).await.unwrap();

        assert_eq!(b1.recv().await.unwrap(), None);
        assert!(manager.is_connected(&password(1)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_attach_racing_remove_leaves_no_orphan_channel() {
        let (manager, _inbound) = LinkManager::new(PeerLinkConfig::default());
        let manager = Arc::new(manager);

        for round in 0..200u32 {
            let p = password((round % 250) as u8);
            manager.add_link(P2PLink::new(p, "racy")).await;
            let (a, _b) = MemoryChannel::pair();

            let attaching = {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.attach(&p, Arc::new(a)).await })
            };
            let removing = {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.remove_link(&p).await })
            };

            let attached = attaching.await.unwrap();
            removing.await.unwrap().unwrap();

            if let Err(e) = attached {
                assert!(matches!(e, PeerLinkError::UnknownLink(_)));
            }
            assert!(!manager.links().await.contains(&p));
            assert!(!manager.is_connected(&p).await, "round {}", round);
        }
    }
}

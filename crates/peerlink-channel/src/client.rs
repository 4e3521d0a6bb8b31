//! Per-connection data channel client.
//!
//! The client splits outgoing messages onto the transport. A single spawned
//! receive loop owns the reassembly buffer, answers every completed message
//! with a receipt and resolves senders waiting on receipts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;

use peerlink_core::{split_with_chunk_size, AssembledMessage, DataChannelMessage, MessageId, Receipt};

use crate::buffer::ReassemblyBuffer;
use crate::config::ChannelConfig;
use crate::dedup::DeliveredHistory;
use crate::error::{ChannelError, Result};
use crate::transport::DataChannel;

/// Produces IDs for outgoing messages.
pub type IdGenerator = Arc<dyn Fn() -> MessageId + Send + Sync>;

type PendingReceipts = Arc<Mutex<HashMap<MessageId, oneshot::Sender<Receipt>>>>;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// A receipt observed on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptEvent {
    /// We acknowledged a message from the peer.
    Sent(Receipt),
    /// The peer acknowledged one of our messages.
    Received(Receipt),
}

/// Inbound streams of a client.
///
/// Both end when the receive loop stops.
pub struct ChannelStreams {
    /// Reassembled, hash-verified messages.
    pub messages: ReceiverStream<AssembledMessage>,
    /// Receipts sent and received. Events are dropped if nobody keeps up.
    pub receipts: ReceiverStream<ReceiptEvent>,
}

/// Client for one data channel connection.
pub struct DataChannelClient {
    channel: Arc<dyn DataChannel>,
    config: ChannelConfig,
    id_generator: IdGenerator,
    pending: PendingReceipts,
    task: JoinHandle<()>,
}

impl DataChannelClient {
    /// Start a client with random UUID message IDs.
    pub fn spawn(channel: Arc<dyn DataChannel>, config: ChannelConfig) -> (Self, ChannelStreams) {
        Self::spawn_with_id_generator(channel, config, Arc::new(MessageId::random))
    }

    /// Start a client with a custom message ID source.
    pub fn spawn_with_id_generator(
        channel: Arc<dyn DataChannel>,
        config: ChannelConfig,
        id_generator: IdGenerator,
    ) -> (Self, ChannelStreams) {
        let capacity = config.stream_capacity.max(1);
        let (messages_tx, messages_rx) = mpsc::channel(capacity);
        let (receipts_tx, receipts_rx) = mpsc::channel(capacity);
        let pending: PendingReceipts = Arc::default();

        let receive_loop = ReceiveLoop {
            channel: Arc::clone(&channel),
            buffer: ReassemblyBuffer::new(&config),
            delivered: DeliveredHistory::new(config.delivered_history),
            pending: Arc::clone(&pending),
            messages_tx,
            receipts_tx,
            sweep_interval: config.sweep_interval.max(MIN_SWEEP_INTERVAL),
        };
        let task = tokio::spawn(receive_loop.run());

        let client = Self {
            channel,
            config,
            id_generator,
            pending,
            task,
        };
        let streams = ChannelStreams {
            messages: ReceiverStream::new(messages_rx),
            receipts: ReceiverStream::new(receipts_rx),
        };
        (client, streams)
    }

    /// Send `content` under a fresh ID.
    ///
    /// Returns once every packet has been handed to the transport.
    pub async fn send_message(&self, content: impl Into<Bytes>) -> Result<MessageId> {
        let message_id = (self.id_generator)();
        self.send_message_with_id(content, message_id.clone()).await?;
        Ok(message_id)
    }

    /// Send `content` under `message_id`.
    pub async fn send_message_with_id(
        &self,
        content: impl Into<Bytes>,
        message_id: MessageId,
    ) -> Result<()> {
        let packets = split_with_chunk_size(content, message_id.clone(), self.config.chunk_size);
        let packet_count = packets.len();

        for packet in packets {
            let encoded = DataChannelMessage::from(packet).encode()?;
            self.channel.send(Bytes::from(encoded)).await?;
        }

        tracing::debug!(message_id = %message_id, packets = packet_count, "message sent");
        Ok(())
    }

    /// Send `content` and wait for the peer's receipt.
    ///
    /// A confirmation yields the message ID. An error receipt becomes
    /// [`ChannelError::Rejected`]; the caller decides whether to resend.
    pub async fn send_message_confirmed(&self, content: impl Into<Bytes>) -> Result<MessageId> {
        let message_id = (self.id_generator)();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(message_id.clone(), tx);

        if self.task.is_finished() {
            self.pending.lock().await.remove(&message_id);
            return Err(ChannelError::Closed);
        }

        if let Err(e) = self.send_message_with_id(content, message_id.clone()).await {
            self.pending.lock().await.remove(&message_id);
            return Err(e);
        }

        match tokio::time::timeout(self.config.receipt_timeout, rx).await {
            Ok(Ok(Receipt::Confirmation(_))) => Ok(message_id),
            Ok(Ok(Receipt::Error(error))) => Err(ChannelError::Rejected {
                message_id,
                reason: error.error,
            }),
            Ok(Err(_)) => Err(ChannelError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&message_id);
                Err(ChannelError::Timeout(message_id))
            }
        }
    }

    /// Whether the receive loop is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the receive loop, discard partial messages and close the transport.
    pub async fn close(&self) -> Result<()> {
        self.task.abort();
        self.pending.lock().await.clear();
        self.channel.close().await
    }
}

impl Drop for DataChannelClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Receive loop
// ────────────────────────────────────────────────────────────────────────────

struct ReceiveLoop {
    channel: Arc<dyn DataChannel>,
    buffer: ReassemblyBuffer,
    delivered: DeliveredHistory,
    pending: PendingReceipts,
    messages_tx: mpsc::Sender<AssembledMessage>,
    receipts_tx: mpsc::Sender<ReceiptEvent>,
    sweep_interval: Duration,
}

impl ReceiveLoop {
    async fn run(mut self) {
        let channel = Arc::clone(&self.channel);
        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                packet = channel.recv() => match packet {
                    Ok(Some(bytes)) => self.handle_packet(&bytes).await,
                    Ok(None) => {
                        tracing::debug!("data channel closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "data channel receive failed");
                        break;
                    }
                },
                _ = sweep.tick() => {
                    self.buffer.evict_expired(Instant::now().into_std());
                }
            }
        }

        self.buffer.clear();
        self.delivered.clear();
        self.pending.lock().await.clear();
    }

    async fn handle_packet(&mut self, bytes: &[u8]) {
        let message = match DataChannelMessage::decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, len = bytes.len(), "dropping undecodable packet");
                return;
            }
        };

        match message {
            DataChannelMessage::ChunkedMessage(packet) => {
                match self.buffer.insert(packet, Instant::now().into_std()) {
                    None => {}
                    Some(Ok(assembled)) => self.deliver(assembled).await,
                    Some(Err(e)) => {
                        tracing::warn!(
                            message_id = %e.message_id(),
                            error = %e,
                            "message reassembly failed"
                        );
                        self.send_receipt(Receipt::Error(e.to_receive_error())).await;
                    }
                }
            }
            DataChannelMessage::Receipt(receipt) => self.handle_receipt(receipt).await,
        }
    }

    async fn deliver(&mut self, message: AssembledMessage) {
        let message_id = message.id_of_chunks().clone();
        self.send_receipt(Receipt::confirmation(message_id.clone())).await;

        if !self.delivered.insert(*message.message_hash()) {
            tracing::debug!(message_id = %message_id, "already delivered, confirmed again");
            return;
        }

        tracing::debug!(
            message_id = %message_id,
            len = message.message_content().len(),
            "message assembled"
        );
        if self.messages_tx.send(message).await.is_err() {
            tracing::debug!(message_id = %message_id, "message stream dropped");
        }
    }

    async fn send_receipt(&self, receipt: Receipt) {
        let encoded = match DataChannelMessage::from(receipt.clone()).encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(message_id = %receipt.message_id(), error = %e, "failed to encode receipt");
                return;
            }
        };

        if let Err(e) = self.channel.send(Bytes::from(encoded)).await {
            tracing::error!(message_id = %receipt.message_id(), error = %e, "failed to send receipt");
            return;
        }
        self.emit(ReceiptEvent::Sent(receipt));
    }

    async fn handle_receipt(&mut self, receipt: Receipt) {
        tracing::trace!(message_id = %receipt.message_id(), "receipt received");
        if let Some(waiter) = self.pending.lock().await.remove(receipt.message_id()) {
            let _ = waiter.send(receipt.clone());
        }
        self.emit(ReceiptEvent::Received(receipt));
    }

    fn emit(&self, event: ReceiptEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.receipts_tx.try_send(event) {
            tracing::trace!(?event, "receipt stream full, dropping event");
        }
    }
}

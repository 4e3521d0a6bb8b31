//! Inbound reassembly buffer.
//!
//! Packets are grouped by message ID until the metadata is known and at least
//! `chunk_count` distinct chunk indices have arrived. At that point the entry
//! leaves the buffer and is assembled exactly once.
//!
//! The first metadata for an ID wins; a later, different one is ignored.
//! A repeated chunk index replaces the earlier chunk.
//!
//! Memory held per ID is bounded: chunks larger than the chunk size, chunks
//! past the announced `chunk_count`, and chunks beyond `max_chunks_per_message`
//! are dropped. Dropped packets do not count as activity, so a peer flooding
//! one ID still hits the idle timeout.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use peerlink_core::{
    AssembleError, AssembledMessage, ChunkPackage, ChunkedMessage, MessageId, MetaDataPackage, CHUNK_SIZE,
};

use crate::config::ChannelConfig;

/// Outcome of a completed entry.
pub type Assembled = std::result::Result<AssembledMessage, AssembleError>;

struct PendingMessage {
    meta: Option<MetaDataPackage>,
    chunks: BTreeMap<usize, ChunkPackage>,
    last_activity: Instant,
}

impl PendingMessage {
    fn new(now: Instant) -> Self {
        Self {
            meta: None,
            chunks: BTreeMap::new(),
            last_activity: now,
        }
    }

    fn is_complete(&self) -> bool {
        match &self.meta {
            Some(meta) => self.chunks.len() >= meta.chunk_count,
            None => false,
        }
    }

    fn accept_metadata(&mut self, meta: MetaDataPackage) -> bool {
        match &self.meta {
            None => {
                tracing::trace!(
                    message_id = %meta.message_id,
                    chunk_count = meta.chunk_count,
                    byte_count = meta.message_byte_count,
                    "metadata received"
                );
                let out_of_range = self.chunks.split_off(&meta.chunk_count);
                if !out_of_range.is_empty() {
                    tracing::warn!(
                        message_id = %meta.message_id,
                        dropped = out_of_range.len(),
                        "dropping chunks past announced chunk count"
                    );
                }
                self.meta = Some(meta);
                true
            }
            Some(existing) if *existing == meta => true,
            Some(_) => {
                tracing::warn!(message_id = %meta.message_id, "conflicting metadata ignored");
                false
            }
        }
    }

    fn accept_chunk(&mut self, chunk: ChunkPackage, max_chunks: usize) -> bool {
        if let Some(meta) = &self.meta {
            if chunk.chunk_index >= meta.chunk_count {
                tracing::warn!(
                    message_id = %chunk.message_id,
                    chunk_index = chunk.chunk_index,
                    chunk_count = meta.chunk_count,
                    "chunk index out of range, dropped"
                );
                return false;
            }
        }
        if !self.chunks.contains_key(&chunk.chunk_index) && self.chunks.len() >= max_chunks {
            tracing::warn!(
                message_id = %chunk.message_id,
                chunk_index = chunk.chunk_index,
                held = self.chunks.len(),
                "too many chunks for one message, dropped"
            );
            return false;
        }
        tracing::trace!(
            message_id = %chunk.message_id,
            chunk_index = chunk.chunk_index,
            len = chunk.chunk_data.len(),
            "chunk received"
        );
        self.chunks.insert(chunk.chunk_index, chunk);
        true
    }
}

/// Per-connection buffer of partially received messages.
pub struct ReassemblyBuffer {
    pending: HashMap<MessageId, PendingMessage>,
    idle_timeout: Duration,
    max_pending: usize,
    max_chunk_size: usize,
    max_chunks: usize,
}

impl ReassemblyBuffer {
    pub fn new(config: &ChannelConfig) -> Self {
        Self {
            pending: HashMap::new(),
            idle_timeout: config.idle_timeout,
            max_pending: config.max_pending_messages.max(1),
            max_chunk_size: if config.chunk_size == 0 { CHUNK_SIZE } else { config.chunk_size },
            max_chunks: config.max_chunks_per_message.max(1),
        }
    }

    /// Add one packet.
    ///
    /// Returns `Some` when this packet completed its message, with either the
    /// verified message or the reason reassembly failed.
    pub fn insert(&mut self, packet: ChunkedMessage, now: Instant) -> Option<Assembled> {
        let message_id = packet.message_id().clone();

        match &packet {
            ChunkedMessage::Chunk(chunk) if chunk.chunk_data.len() > self.max_chunk_size => {
                tracing::warn!(
                    message_id = %message_id,
                    chunk_index = chunk.chunk_index,
                    len = chunk.chunk_data.len(),
                    "oversized chunk dropped"
                );
                return None;
            }
            ChunkedMessage::MetaData(meta) if meta.chunk_count > self.max_chunks => {
                tracing::warn!(
                    message_id = %message_id,
                    chunk_count = meta.chunk_count,
                    "metadata announces too many chunks, dropped"
                );
                return None;
            }
            _ => {}
        }

        if !self.pending.contains_key(&message_id) && self.pending.len() >= self.max_pending {
            self.evict_oldest();
        }

        let max_chunks = self.max_chunks;
        let entry = self
            .pending
            .entry(message_id.clone())
            .or_insert_with(|| PendingMessage::new(now));

        let accepted = match packet {
            ChunkedMessage::MetaData(meta) => entry.accept_metadata(meta),
            ChunkedMessage::Chunk(chunk) => entry.accept_chunk(chunk, max_chunks),
        };
        if accepted {
            entry.last_activity = now;
        }

        if !entry.is_complete() {
            return None;
        }

        let done = self.pending.remove(&message_id)?;
        let meta = done.meta?;
        let chunks = done.chunks.into_values().collect();
        Some(AssembledMessage::assemble_from(chunks, &meta))
    }

    /// Drop entries idle for longer than the idle timeout.
    pub fn evict_expired(&mut self, now: Instant) -> Vec<MessageId> {
        let idle_timeout = self.idle_timeout;
        let expired: Vec<MessageId> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.last_activity) > idle_timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.pending.remove(id);
            tracing::warn!(message_id = %id, "discarding idle partial message");
        }
        expired
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .pending
            .iter()
            .min_by_key(|(_, p)| p.last_activity)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.pending.remove(&id);
            tracing::warn!(message_id = %id, "too many pending messages, evicting oldest");
        }
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.pending.contains_key(message_id)
    }

    /// Number of chunks held for `message_id`, if it is pending.
    pub fn held_chunks(&self, message_id: &MessageId) -> Option<usize> {
        self.pending.get(message_id).map(|p| p.chunks.len())
    }
}

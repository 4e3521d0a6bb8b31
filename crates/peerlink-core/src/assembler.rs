//! Chunk splitting and reassembly.
//!
//! An outgoing message becomes one [`MetaDataPackage`] followed by its
//! [`ChunkPackage`]s in ascending index order. An incoming set of chunks is
//! reassembled only when the indices are exactly `0..chunk_count`, the byte
//! count matches and the SHA-256 of the result matches the metadata.

use bytes::{Bytes, BytesMut};

use crate::crypto::Sha256Hash;
use crate::error::AssembleError;
use crate::message::{ChunkPackage, ChunkedMessage, MetaDataPackage};
use crate::types::MessageId;

/// Maximum payload bytes per chunk on the wire.
pub const CHUNK_SIZE: usize = 15441;

/// A complete logical message.
///
/// `message_hash` is always the SHA-256 of `message_content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    id_of_chunks: MessageId,
    message_content: Bytes,
    message_hash: Sha256Hash,
}

impl AssembledMessage {
    /// Wrap outgoing content, hashing it.
    pub fn new(message_content: impl Into<Bytes>, id_of_chunks: MessageId) -> Self {
        let message_content = message_content.into();
        let message_hash = Sha256Hash::hash(&message_content);
        Self {
            id_of_chunks,
            message_content,
            message_hash,
        }
    }

    pub fn id_of_chunks(&self) -> &MessageId {
        &self.id_of_chunks
    }

    pub fn message_content(&self) -> &Bytes {
        &self.message_content
    }

    pub fn message_hash(&self) -> &Sha256Hash {
        &self.message_hash
    }

    pub fn into_content(self) -> Bytes {
        self.message_content
    }

    /// Split with the wire chunk size.
    pub fn split(&self) -> Vec<ChunkedMessage> {
        self.split_with_chunk_size(CHUNK_SIZE)
    }

    /// Split into metadata followed by chunks of at most `chunk_size` bytes.
    ///
    /// A `chunk_size` of zero falls back to [`CHUNK_SIZE`].
    pub fn split_with_chunk_size(&self, chunk_size: usize) -> Vec<ChunkedMessage> {
        let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        let len = self.message_content.len();
        let chunk_count = len.div_ceil(chunk_size);

        let mut out = Vec::with_capacity(chunk_count + 1);
        out.push(ChunkedMessage::MetaData(MetaDataPackage {
            message_id: self.id_of_chunks.clone(),
            chunk_count,
            message_byte_count: len,
            hash_of_message: self.message_hash.into(),
        }));

        for chunk_index in 0..chunk_count {
            let start = chunk_index * chunk_size;
            let end = usize::min(start + chunk_size, len);
            out.push(ChunkedMessage::Chunk(ChunkPackage {
                message_id: self.id_of_chunks.clone(),
                chunk_index,
                chunk_data: self.message_content.slice(start..end),
            }));
        }
        out
    }

    /// Reassemble `chunks` described by `meta`.
    ///
    /// Chunks may be given in any order. Checks run in this order and stop
    /// at the first failure: at least one chunk, indices exactly
    /// `0..chunk_count`, concatenated length, SHA-256.
    ///
    /// The only chunkless message accepted is the empty one, exactly as
    /// [`split`](Self::split) produces it.
    pub fn assemble_from(
        mut chunks: Vec<ChunkPackage>,
        meta: &MetaDataPackage,
    ) -> Result<Self, AssembleError> {
        let message_id = meta.message_id.clone();

        if chunks.is_empty() {
            let empty = Sha256Hash::hash(&[]);
            if meta.chunk_count == 0 && meta.message_byte_count == 0 && meta.hash_of_message == empty {
                return Ok(Self {
                    id_of_chunks: message_id,
                    message_content: Bytes::new(),
                    message_hash: empty,
                });
            }
            return Err(AssembleError::NoPackages { message_id });
        }

        if let Some(foreign) = chunks.iter().find(|c| c.message_id != message_id) {
            return Err(AssembleError::ForeignChunk {
                chunk_message_id: foreign.message_id.clone(),
                message_id,
            });
        }

        chunks.sort_by_key(|c| c.chunk_index);
        let indices_exact = chunks.len() == meta.chunk_count
            && chunks.iter().enumerate().all(|(i, c)| c.chunk_index == i);
        if !indices_exact {
            return Err(AssembleError::IncorrectIndices {
                message_id,
                expected_count: meta.chunk_count,
            });
        }

        let got: usize = chunks.iter().map(|c| c.chunk_data.len()).sum();
        if got != meta.message_byte_count {
            return Err(AssembleError::ByteCountMismatch {
                message_id,
                got,
                stated: meta.message_byte_count,
            });
        }

        let mut content = BytesMut::with_capacity(got);
        for chunk in &chunks {
            content.extend_from_slice(&chunk.chunk_data);
        }
        let message_content = content.freeze();

        let calculated = Sha256Hash::hash(&message_content);
        if calculated != meta.hash_of_message {
            return Err(AssembleError::HashMismatch {
                message_id,
                calculated,
                expected: meta.hash_of_message.clone(),
            });
        }

        Ok(Self {
            id_of_chunks: message_id,
            message_content,
            message_hash: calculated,
        })
    }
}

/// Split `message` under `id` with the wire chunk size.
pub fn split(message: impl Into<Bytes>, id: MessageId) -> Vec<ChunkedMessage> {
    AssembledMessage::new(message, id).split()
}

/// Split `message` under `id` with a custom chunk size.
pub fn split_with_chunk_size(
    message: impl Into<Bytes>,
    id: MessageId,
    chunk_size: usize,
) -> Vec<ChunkedMessage> {
    AssembledMessage::new(message, id).split_with_chunk_size(chunk_size)
}

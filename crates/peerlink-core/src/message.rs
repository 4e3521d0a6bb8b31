//! Data channel wire envelope.
//!
//! Every packet is a flat JSON object. The `packageType` field selects the
//! variant and the variant's own fields sit next to it:
//!
//! ```json
//! {"packageType":"metaData","messageId":"…","chunkCount":2,"messageByteCount":20000,"hashOfMessage":"<hex>"}
//! {"packageType":"chunk","messageId":"…","chunkIndex":0,"chunkData":"<base64>"}
//! {"packageType":"receiveMessageConfirmation","messageId":"…"}
//! {"packageType":"receiveMessageError","messageId":"…","error":"messageHashesMismatch"}
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::MessageHash;
use crate::error::{CoreError, Result};
use crate::types::MessageId;

/// Header describing a chunked message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataPackage {
    pub message_id: MessageId,
    pub chunk_count: usize,
    pub message_byte_count: usize,
    pub hash_of_message: MessageHash,
}

/// One slice of a chunked message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPackage {
    pub message_id: MessageId,
    pub chunk_index: usize,
    #[serde(with = "base64_bytes")]
    pub chunk_data: Bytes,
}

/// A packet belonging to a chunked message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkedMessage {
    MetaData(MetaDataPackage),
    Chunk(ChunkPackage),
}

impl ChunkedMessage {
    pub fn message_id(&self) -> &MessageId {
        match self {
            ChunkedMessage::MetaData(meta) => &meta.message_id,
            ChunkedMessage::Chunk(chunk) => &chunk.message_id,
        }
    }
}

/// Positive receipt: the message was reassembled and verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveConfirmation {
    pub message_id: MessageId,
}

/// The single wire-visible failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiveErrorReason {
    MessageHashesMismatch,
}

/// Negative receipt: reassembly of the message failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveError {
    pub message_id: MessageId,
    pub error: ReceiveErrorReason,
}

/// Acknowledgement for a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Receipt {
    Confirmation(ReceiveConfirmation),
    Error(ReceiveError),
}

impl Receipt {
    pub fn confirmation(message_id: MessageId) -> Self {
        Receipt::Confirmation(ReceiveConfirmation { message_id })
    }

    pub fn message_id(&self) -> &MessageId {
        match self {
            Receipt::Confirmation(c) => &c.message_id,
            Receipt::Error(e) => &e.message_id,
        }
    }
}

/// The unit that crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WirePackage", from = "WirePackage")]
pub enum DataChannelMessage {
    ChunkedMessage(ChunkedMessage),
    Receipt(Receipt),
}

impl DataChannelMessage {
    /// Encode to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Decode from JSON bytes. Unknown `packageType` values are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    pub fn message_id(&self) -> &MessageId {
        match self {
            DataChannelMessage::ChunkedMessage(c) => c.message_id(),
            DataChannelMessage::Receipt(r) => r.message_id(),
        }
    }
}

impl From<ChunkedMessage> for DataChannelMessage {
    fn from(c: ChunkedMessage) -> Self {
        DataChannelMessage::ChunkedMessage(c)
    }
}

impl From<Receipt> for DataChannelMessage {
    fn from(r: Receipt) -> Self {
        DataChannelMessage::Receipt(r)
    }
}

/// Flat wire shape, one variant per `packageType`.
#[derive(Serialize, Deserialize)]
#[serde(tag = "packageType", rename_all = "camelCase")]
enum WirePackage {
    MetaData(MetaDataPackage),
    Chunk(ChunkPackage),
    ReceiveMessageConfirmation(ReceiveConfirmation),
    ReceiveMessageError(ReceiveError),
}

impl From<DataChannelMessage> for WirePackage {
    fn from(msg: DataChannelMessage) -> Self {
        match msg {
            DataChannelMessage::ChunkedMessage(ChunkedMessage::MetaData(m)) => WirePackage::MetaData(m),
            DataChannelMessage::ChunkedMessage(ChunkedMessage::Chunk(c)) => WirePackage::Chunk(c),
            DataChannelMessage::Receipt(Receipt::Confirmation(c)) => {
                WirePackage::ReceiveMessageConfirmation(c)
            }
            DataChannelMessage::Receipt(Receipt::Error(e)) => WirePackage::ReceiveMessageError(e),
        }
    }
}

impl From<WirePackage> for DataChannelMessage {
    fn from(wire: WirePackage) -> Self {
        match wire {
            WirePackage::MetaData(m) => ChunkedMessage::MetaData(m).into(),
            WirePackage::Chunk(c) => ChunkedMessage::Chunk(c).into(),
            WirePackage::ReceiveMessageConfirmation(c) => Receipt::Confirmation(c).into(),
            WirePackage::ReceiveMessageError(e) => Receipt::Error(e).into(),
        }
    }
}

/// Standard padded base64 for chunk payloads.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;
    use serde_json::{json, Value};

    fn to_value(msg: &DataChannelMessage) -> Value {
        serde_json::from_slice(&msg.encode().unwrap()).unwrap()
    }

    #[test]
    fn test_metadata_wire_shape() {
        let msg: DataChannelMessage = ChunkedMessage::MetaData(MetaDataPackage {
            message_id: MessageId::new("m1"),
            chunk_count: 2,
            message_byte_count: 20000,
            hash_of_message: sha256(b"abc").into(),
        })
        .into();

        assert_eq!(
            to_value(&msg),
            json!({
                "packageType": "metaData",
                "messageId": "m1",
                "chunkCount": 2,
                "messageByteCount": 20000,
                "hashOfMessage": "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            })
        );
    }

    #[test]
    fn test_chunk_wire_shape_uses_base64() {
        let msg: DataChannelMessage = ChunkedMessage::Chunk(ChunkPackage {
            message_id: MessageId::new("m1"),
            chunk_index: 0,
            chunk_data: Bytes::from_static(b"hello"),
        })
        .into();

        assert_eq!(
            to_value(&msg),
            json!({
                "packageType": "chunk",
                "messageId": "m1",
                "chunkIndex": 0,
                "chunkData": "aGVsbG8=",
            })
        );
    }

    #[test]
    fn test_receipt_wire_shapes() {
        let ok: DataChannelMessage = Receipt::confirmation(MessageId::new("m1")).into();
        assert_eq!(
            to_value(&ok),
            json!({"packageType": "receiveMessageConfirmation", "messageId": "m1"})
        );

        let err: DataChannelMessage = Receipt::Error(ReceiveError {
            message_id: MessageId::new("m1"),
            error: ReceiveErrorReason::MessageHashesMismatch,
        })
        .into();
        assert_eq!(
            to_value(&err),
            json!({
                "packageType": "receiveMessageError",
                "messageId": "m1",
                "error": "messageHashesMismatch",
            })
        );
    }

    #[test]
    fn test_decode_each_variant() {
        let decoded = DataChannelMessage::decode(
            br#"{"packageType":"chunk","messageId":"x","chunkIndex":3,"chunkData":"AAEC"}"#,
        )
        .unwrap();
        assert_eq!(
            decoded,
            DataChannelMessage::ChunkedMessage(ChunkedMessage::Chunk(ChunkPackage {
                message_id: MessageId::new("x"),
                chunk_index: 3,
                chunk_data: Bytes::from_static(&[0, 1, 2]),
            }))
        );

        let decoded = DataChannelMessage::decode(
            br#"{"messageId":"x","packageType":"receiveMessageConfirmation"}"#,
        )
        .unwrap();
        assert_eq!(
            decoded,
            DataChannelMessage::from(Receipt::confirmation(MessageId::new("x")))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_package_type() {
        let err = DataChannelMessage::decode(br#"{"packageType":"ping","messageId":"x"}"#);
        assert!(matches!(err, Err(CoreError::DecodingError(_))));
    }

    #[test]
    fn test_decode_rejects_missing_discriminator_and_garbage() {
        assert!(DataChannelMessage::decode(br#"{"messageId":"x"}"#).is_err());
        assert!(DataChannelMessage::decode(b"not json").is_err());
        assert!(DataChannelMessage::decode(
            br#"{"packageType":"chunk","messageId":"x","chunkIndex":0,"chunkData":"***"}"#
        )
        .is_err());
        assert!(DataChannelMessage::decode(
            br#"{"packageType":"receiveMessageError","messageId":"x","error":"other"}"#
        )
        .is_err());
    }

    #[test]
    fn test_decode_then_encode_is_stable() {
        let raw = br#"{"packageType":"metaData","messageId":"id","chunkCount":1,"messageByteCount":3,"hashOfMessage":"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"}"#;
        let first = DataChannelMessage::decode(raw).unwrap();
        let second = DataChannelMessage::decode(&first.encode().unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.message_id().as_str(), "id");
    }

    #[test]
    fn test_metadata_hash_of_any_length_decodes() {
        let raw = br#"{"packageType":"metaData","messageId":"id","chunkCount":1,"messageByteCount":3,"hashOfMessage":"ba7816bf"}"#;
        let DataChannelMessage::ChunkedMessage(ChunkedMessage::MetaData(meta)) =
            DataChannelMessage::decode(raw).unwrap()
        else {
            panic!("expected metadata");
        };
        assert_eq!(meta.hash_of_message.len(), 4);
        assert_ne!(meta.hash_of_message, sha256(b"abc"));
    }
}

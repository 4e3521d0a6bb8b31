//! Golden vectors for the wire format and the key abstraction.
//!
//! Peers built independently must agree on these bytes exactly.

use bytes::Bytes;

use peerlink_core::{
    ChunkPackage, ChunkedMessage, Curve, DataChannelMessage, MessageId, MetaDataPackage, PrivateKey,
    Receipt, ReceiveError, ReceiveErrorReason, Sha256Hash,
};

/// SHA-256 of `hello world`.
pub const HELLO_WORLD_SHA256: &str =
    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

/// A packet and its JSON encoding.
#[derive(Debug, Clone)]
pub struct WireVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Expected JSON. Field order is not significant.
    pub json: &'static str,
    /// The decoded packet.
    pub message: DataChannelMessage,
}

/// All wire vectors, one per `packageType`.
pub fn wire_vectors() -> Vec<WireVector> {
    let id = MessageId::new("m1");
    vec![
        WireVector {
            name: "metadata for hello world",
            json: r#"{"packageType":"metaData","messageId":"m1","chunkCount":1,"messageByteCount":11,"hashOfMessage":"b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"}"#,
            message: ChunkedMessage::MetaData(MetaDataPackage {
                message_id: id.clone(),
                chunk_count: 1,
                message_byte_count: 11,
                hash_of_message: Sha256Hash::hash(b"hello world").into(),
            })
            .into(),
        },
        WireVector {
            name: "single chunk of hello world",
            json: r#"{"packageType":"chunk","messageId":"m1","chunkIndex":0,"chunkData":"aGVsbG8gd29ybGQ="}"#,
            message: ChunkedMessage::Chunk(ChunkPackage {
                message_id: id.clone(),
                chunk_index: 0,
                chunk_data: Bytes::from_static(b"hello world"),
            })
            .into(),
        },
        WireVector {
            name: "confirmation",
            json: r#"{"packageType":"receiveMessageConfirmation","messageId":"m1"}"#,
            message: Receipt::confirmation(id.clone()).into(),
        },
        WireVector {
            name: "hash mismatch error",
            json: r#"{"packageType":"receiveMessageError","messageId":"m1","error":"messageHashesMismatch"}"#,
            message: Receipt::Error(ReceiveError {
                message_id: id,
                error: ReceiveErrorReason::MessageHashesMismatch,
            })
            .into(),
        },
    ]
}

/// A private key and the values derived from it.
#[derive(Debug, Clone)]
pub struct KeyVector {
    pub name: &'static str,
    pub curve: Curve,
    pub private_key: &'static str,
    /// Compressed public key, hex.
    pub public_key: &'static str,
    /// Message to sign, hex.
    pub message: &'static str,
    /// Expected signature, hex. Empty when signing is not deterministic
    /// across implementations.
    pub signature: &'static str,
}

/// Known keys.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "RFC 8032 test 1",
            curve: Curve::Curve25519,
            private_key: "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
            public_key: "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
            message: "",
            signature: "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
        },
        KeyVector {
            name: "secp256k1 generator",
            curve: Curve::Secp256k1,
            private_key: "0000000000000000000000000000000000000000000000000000000000000001",
            public_key: "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            message: "68656c6c6f",
            signature: "",
        },
    ]
}

/// Check every key vector, returning `(name, passed)` pairs.
pub fn verify_key_vectors() -> Vec<(String, bool)> {
    key_vectors()
        .iter()
        .map(|v| (v.name.to_string(), check_key_vector(v)))
        .collect()
}

fn check_key_vector(v: &KeyVector) -> bool {
    let Ok(key) = PrivateKey::from_hex(v.curve, v.private_key) else {
        return false;
    };
    let Ok(message) = hex::decode(v.message) else {
        return false;
    };
    let public_key = key.public_key();
    if hex::encode(public_key.compressed_representation()) != v.public_key {
        return false;
    }
    let Ok(output) = key.sign(&message, false) else {
        return false;
    };
    let signature = output.signature_with_public_key.signature();
    if !v.signature.is_empty() && signature.to_hex() != v.signature {
        return false;
    }
    let signed: &[u8] = match v.curve {
        Curve::Curve25519 => &message,
        Curve::Secp256k1 => output.hash_of_message.as_bytes(),
    };
    public_key.is_valid_signature(&signature, signed)
}

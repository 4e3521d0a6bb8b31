//! Proptest generators for property-based testing.

use proptest::prelude::*;

use peerlink_core::{
    split_with_chunk_size, ChunkedMessage, ConnectionPassword, Curve, MessageId, PrivateKey,
    Sha256Hash, CHUNK_SIZE,
};

/// Generate a message ID.
pub fn message_id() -> impl Strategy<Value = MessageId> {
    "[a-zA-Z0-9-]{1,36}".prop_map(MessageId::new)
}

/// Generate a connection password.
pub fn connection_password() -> impl Strategy<Value = ConnectionPassword> {
    any::<[u8; 32]>().prop_map(ConnectionPassword::from_bytes)
}

/// Generate a SHA-256 hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash::from_bytes)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a curve.
pub fn curve() -> impl Strategy<Value = Curve> {
    prop_oneof![Just(Curve::Curve25519), Just(Curve::Secp256k1)]
}

/// Generate a private key on either curve.
///
/// Seeds that are not valid secp256k1 scalars are filtered out.
pub fn private_key() -> impl Strategy<Value = PrivateKey> {
    (curve(), any::<[u8; 32]>())
        .prop_filter_map("invalid scalar", |(curve, bytes)| {
            PrivateKey::from_bytes(curve, &bytes).ok()
        })
}

/// Parameters for splitting a message.
///
/// Small chunk sizes keep multi-chunk cases cheap; lengths around
/// multiples of the chunk size are weighted in.
#[derive(Debug, Clone)]
pub struct MessageParams {
    pub message_id: MessageId,
    pub content: Vec<u8>,
    pub chunk_size: usize,
}

impl MessageParams {
    /// Split into metadata followed by chunks.
    pub fn packets(&self) -> Vec<ChunkedMessage> {
        split_with_chunk_size(self.content.clone(), self.message_id.clone(), self.chunk_size)
    }
}

impl Arbitrary for MessageParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let chunk_size = prop_oneof![1usize..=64, Just(CHUNK_SIZE)];
        (message_id(), chunk_size)
            .prop_flat_map(|(message_id, chunk_size)| {
                let boundary = (0usize..=3).prop_flat_map(move |k| {
                    let base = (chunk_size * k).min(4 * CHUNK_SIZE);
                    base.saturating_sub(1)..=base + 1
                });
                let len = prop_oneof![0usize..=512, boundary];
                (Just(message_id), Just(chunk_size), len)
            })
            .prop_flat_map(|(message_id, chunk_size, len)| {
                prop::collection::vec(any::<u8>(), len).prop_map(move |content| MessageParams {
                    message_id: message_id.clone(),
                    content,
                    chunk_size,
                })
            })
            .boxed()
    }
}

/// A message's packets in a random order.
pub fn shuffled_packets() -> impl Strategy<Value = (MessageParams, Vec<ChunkedMessage>)> {
    any::<MessageParams>().prop_flat_map(|params| {
        let packets = params.packets();
        (Just(params), Just(packets).prop_shuffle())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::{AssembledMessage, DataChannelMessage};

    fn assemble(packets: Vec<ChunkedMessage>) -> AssembledMessage {
        let mut meta = None;
        let mut chunks = Vec::new();
        for packet in packets {
            match packet {
                ChunkedMessage::MetaData(m) => meta = Some(m),
                ChunkedMessage::Chunk(c) => chunks.push(c),
            }
        }
        AssembledMessage::assemble_from(chunks, &meta.unwrap()).unwrap()
    }

    proptest! {
        #[test]
        fn test_split_then_assemble_roundtrip(params: MessageParams) {
            let message = assemble(params.packets());
            prop_assert_eq!(message.message_content().as_ref(), params.content.as_slice());
            prop_assert_eq!(message.id_of_chunks(), &params.message_id);
        }

        #[test]
        fn test_reordering_tolerated((params, packets) in shuffled_packets()) {
            let message = assemble(packets);
            prop_assert_eq!(message.message_content().as_ref(), params.content.as_slice());
        }

        #[test]
        fn test_envelope_idempotent(params: MessageParams) {
            for packet in params.packets() {
                let wire = DataChannelMessage::from(packet);
                let once = wire.encode().unwrap();
                let decoded = DataChannelMessage::decode(&once).unwrap();
                prop_assert_eq!(&decoded, &wire);
                prop_assert_eq!(decoded.encode().unwrap(), once);
            }
        }

        #[test]
        fn test_signature_roundtrip(key in private_key(), data in payload(256)) {
            let output = key.sign(&data, false).unwrap();
            let public_key = key.public_key();
            prop_assert_eq!(output.signature_with_public_key.public_key(), public_key);
            let signed: &[u8] = match key.curve() {
                Curve::Curve25519 => &data,
                Curve::Secp256k1 => output.hash_of_message.as_bytes(),
            };
            prop_assert!(output.signature_with_public_key.is_valid(signed));
        }
    }
}

//! Hashing primitives.
//!
//! Assembly verification uses a single SHA-256 pass. Signing identifiers use
//! SHA-256 applied twice.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte SHA-256 digest.
///
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::DecodingError(format!("hash must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Sha256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Sha256Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The `hashOfMessage` a peer announced in metadata.
///
/// Kept at whatever length arrived on the wire. Anything other than a
/// 32-byte value never equals a computed [`Sha256Hash`], so a malformed
/// announcement fails verification and earns an error receipt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageHash(Vec<u8>);

impl MessageHash {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex of any even length.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        Ok(Self(hex::decode(s)?))
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "MessageHash({})", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Sha256Hash> for MessageHash {
    fn from(hash: Sha256Hash) -> Self {
        Self(hash.0.to_vec())
    }
}

impl PartialEq<Sha256Hash> for MessageHash {
    fn eq(&self, other: &Sha256Hash) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl PartialEq<MessageHash> for Sha256Hash {
    fn eq(&self, other: &MessageHash) -> bool {
        other == self
    }
}

impl Serialize for MessageHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MessageHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MessageHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Sha256Hash {
    Sha256Hash::hash(data)
}

/// SHA-256 of SHA-256 of `data`.
pub fn sha256_twice(data: &[u8]) -> Sha256Hash {
    Sha256Hash::hash(&Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_sha256_known_values() {
        assert_eq!(sha256(b"").to_hex(), EMPTY_SHA256);
        assert_eq!(sha256(b"abc").to_hex(), ABC_SHA256);
    }

    #[test]
    fn test_sha256_twice_is_composition() {
        let once = sha256(b"abc");
        let twice = sha256_twice(b"abc");
        assert_eq!(twice, sha256(once.as_bytes()));
        assert_ne!(twice, once);
    }

    #[test]
    fn test_hex_roundtrip_accepts_uppercase() {
        let h = sha256(b"abc");
        assert_eq!(Sha256Hash::from_hex(&h.to_hex()).unwrap(), h);
        assert_eq!(Sha256Hash::from_hex(&h.to_hex().to_uppercase()).unwrap(), h);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(Sha256Hash::from_hex("abcd").is_err());
        assert!(Sha256Hash::from_hex("zz").is_err());
    }

    #[test]
    fn test_serde_is_lowercase_hex() {
        let h = sha256(b"abc");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", ABC_SHA256));
        let back: Sha256Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_message_hash_keeps_any_length() {
        let short = MessageHash::from_hex("abcd").unwrap();
        assert_eq!(short.len(), 2);
        assert_ne!(short, sha256(b"abc"));

        let full: MessageHash = sha256(b"abc").into();
        assert_eq!(full, sha256(b"abc"));
        assert_eq!(full.to_hex(), ABC_SHA256);
        assert!(MessageHash::from_hex("abc").is_err());
    }
}

//! SLIP10 multi-curve keys and signatures.
//!
//! A key is either Curve25519 (Ed25519, EdDSA) or secp256k1 (recoverable
//! ECDSA). The variant is fixed when the key is created.
//!
//! Signing always reports `SHA-256(SHA-256(data))` as the message identifier.
//! Ed25519 signs the raw data; secp256k1 signs that 32-byte hash.

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::hazmat::PrehashVerifier as _;
use k256::ecdsa::RecoveryId;
use rand::rngs::OsRng;
use std::fmt;

use crate::crypto::{sha256_twice, Sha256Hash};
use crate::error::{CoreError, Result};

/// The two supported curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Curve25519,
    Secp256k1,
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Curve25519 => f.write_str("curve25519"),
            Curve::Secp256k1 => f.write_str("secp256k1"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Private keys
// ────────────────────────────────────────────────────────────────────────────

/// A SLIP10 private key.
#[derive(Clone)]
pub enum PrivateKey {
    Curve25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

/// Result of [`PrivateKey::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutput {
    /// Curve-tagged signature together with the signer's public key.
    pub signature_with_public_key: SignatureWithPublicKey,
    /// `SHA-256(SHA-256(data))`, regardless of curve.
    pub hash_of_message: Sha256Hash,
}

impl PrivateKey {
    /// Generate a fresh random key on `curve`.
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::Curve25519 => PrivateKey::Curve25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            Curve::Secp256k1 => PrivateKey::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    /// Load a 32-byte private key on `curve`.
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        match curve {
            Curve::Curve25519 => {
                let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidPrivateKey)?;
                Ok(PrivateKey::Curve25519(ed25519_dalek::SigningKey::from_bytes(&arr)))
            }
            Curve::Secp256k1 => k256::ecdsa::SigningKey::from_slice(bytes)
                .map(PrivateKey::Secp256k1)
                .map_err(|_| CoreError::InvalidPrivateKey),
        }
    }

    /// Parse a hex-encoded private key on `curve`.
    pub fn from_hex(curve: Curve, s: &str) -> Result<Self> {
        Self::from_bytes(curve, &hex::decode(s)?)
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self {
            PrivateKey::Curve25519(_) => Curve::Curve25519,
            PrivateKey::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// Raw 32-byte scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        match self {
            PrivateKey::Curve25519(key) => key.to_bytes(),
            PrivateKey::Secp256k1(key) => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&key.to_bytes());
                out
            }
        }
    }

    /// Raw scalar as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The matching public key, same variant.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Curve25519(key) => PublicKey::Curve25519(key.verifying_key()),
            PrivateKey::Secp256k1(key) => PublicKey::Secp256k1(*key.verifying_key()),
        }
    }

    /// Sign `data`.
    ///
    /// With `skip_hashing_if_ecdsa` a secp256k1 key signs `data` verbatim,
    /// which must then already be a 32-byte hash. The flag has no effect on
    /// Curve25519 keys.
    pub fn sign(&self, data: &[u8], skip_hashing_if_ecdsa: bool) -> Result<SignOutput> {
        let hash_of_message = sha256_twice(data);

        let signature_with_public_key = match self {
            PrivateKey::Curve25519(key) => SignatureWithPublicKey::Curve25519 {
                signature: key.sign(data),
                public_key: key.verifying_key(),
            },
            PrivateKey::Secp256k1(key) => {
                let prehash: &[u8] = if skip_hashing_if_ecdsa {
                    if data.len() != 32 {
                        return Err(CoreError::InvalidHashLength(data.len()));
                    }
                    data
                } else {
                    hash_of_message.as_bytes()
                };

                let (signature, recovery_id) = key
                    .sign_prehash_recoverable(prehash)
                    .map_err(|e| CoreError::SigningFailed(e.to_string()))?;

                SignatureWithPublicKey::Secp256k1 {
                    signature: RecoverableSignature {
                        signature,
                        recovery_id,
                    },
                    public_key: *key.verifying_key(),
                }
            }
        };

        Ok(SignOutput {
            signature_with_public_key,
            hash_of_message,
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, <redacted>)", self.curve())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public keys
// ────────────────────────────────────────────────────────────────────────────

/// A SLIP10 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKey {
    Curve25519(ed25519_dalek::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
}

impl PublicKey {
    /// Parse a public key on `curve`.
    ///
    /// secp256k1 accepts both the 33-byte and 65-byte SEC1 encodings.
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        match curve {
            Curve::Curve25519 => {
                let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidPublicKey)?;
                ed25519_dalek::VerifyingKey::from_bytes(&arr)
                    .map(PublicKey::Curve25519)
                    .map_err(|_| CoreError::InvalidPublicKey)
            }
            Curve::Secp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                .map(PublicKey::Secp256k1)
                .map_err(|_| CoreError::InvalidPublicKey),
        }
    }

    /// Parse a hex-encoded public key on `curve`.
    pub fn from_hex(curve: Curve, s: &str) -> Result<Self> {
        Self::from_bytes(curve, &hex::decode(s)?)
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self {
            PublicKey::Curve25519(_) => Curve::Curve25519,
            PublicKey::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// 33-byte SEC1 for secp256k1, the 32-byte key for Ed25519.
    pub fn compressed_representation(&self) -> Vec<u8> {
        match self {
            PublicKey::Curve25519(key) => key.to_bytes().to_vec(),
            PublicKey::Secp256k1(key) => key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// 65-byte SEC1 for secp256k1, the 32-byte key for Ed25519.
    pub fn uncompressed_representation(&self) -> Vec<u8> {
        match self {
            PublicKey::Curve25519(key) => key.to_bytes().to_vec(),
            PublicKey::Secp256k1(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Compressed representation as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.compressed_representation())
    }

    /// Check `signature` against this key.
    ///
    /// For Ed25519 `message` is the signed data. For secp256k1 it is the
    /// 32-byte hash that was signed, and the key recovered from the signature
    /// must equal this key. Mismatched curves are never valid.
    pub fn is_valid_signature(&self, signature: &Signature, message: &[u8]) -> bool {
        match (self, signature) {
            (PublicKey::Curve25519(key), Signature::Curve25519(sig)) => {
                key.verify(message, sig).is_ok()
            }
            (PublicKey::Secp256k1(key), Signature::Secp256k1(sig)) => {
                if message.len() != 32 {
                    return false;
                }
                if key.verify_prehash(message, &sig.signature).is_err() {
                    return false;
                }
                matches!(sig.recover(message), Ok(recovered) if recovered == *key)
            }
            _ => false,
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.curve(), self.to_hex())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signatures
// ────────────────────────────────────────────────────────────────────────────

/// A recoverable secp256k1 ECDSA signature.
///
/// Byte layout is `recovery_id || r || s`, 65 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub signature: k256::ecdsa::Signature,
    pub recovery_id: RecoveryId,
}

impl RecoverableSignature {
    pub const LENGTH: usize = 65;

    /// Serialize as `recovery_id || r || s`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = self.recovery_id.to_byte();
        out[1..].copy_from_slice(&self.signature.to_bytes());
        out
    }

    /// Parse `recovery_id || r || s`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LENGTH {
            return Err(CoreError::InvalidSignature);
        }
        let recovery_id = RecoveryId::from_byte(bytes[0]).ok_or(CoreError::InvalidSignature)?;
        let signature =
            k256::ecdsa::Signature::from_slice(&bytes[1..]).map_err(|_| CoreError::InvalidSignature)?;
        Ok(Self {
            signature,
            recovery_id,
        })
    }

    /// Recover the signer's key from the signed 32-byte hash.
    pub fn recover(&self, prehash: &[u8]) -> Result<k256::ecdsa::VerifyingKey> {
        k256::ecdsa::VerifyingKey::recover_from_prehash(prehash, &self.signature, self.recovery_id)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

/// A curve-tagged signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Curve25519(ed25519_dalek::Signature),
    Secp256k1(RecoverableSignature),
}

impl Signature {
    /// The curve this signature was made on.
    pub fn curve(&self) -> Curve {
        match self {
            Signature::Curve25519(_) => Curve::Curve25519,
            Signature::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// 64 bytes for Ed25519, 65 for recoverable secp256k1.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Signature::Curve25519(sig) => sig.to_bytes().to_vec(),
            Signature::Secp256k1(sig) => sig.to_bytes().to_vec(),
        }
    }

    /// Parse a signature on `curve`.
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        match curve {
            Curve::Curve25519 => {
                let arr: [u8; 64] = bytes.try_into().map_err(|_| CoreError::InvalidSignature)?;
                Ok(Signature::Curve25519(ed25519_dalek::Signature::from_bytes(&arr)))
            }
            Curve::Secp256k1 => RecoverableSignature::from_bytes(bytes).map(Signature::Secp256k1),
        }
    }

    /// Signature bytes as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// A signature paired with the key that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureWithPublicKey {
    Curve25519 {
        signature: ed25519_dalek::Signature,
        public_key: ed25519_dalek::VerifyingKey,
    },
    Secp256k1 {
        signature: RecoverableSignature,
        public_key: k256::ecdsa::VerifyingKey,
    },
}

impl SignatureWithPublicKey {
    pub fn signature(&self) -> Signature {
        match self {
            SignatureWithPublicKey::Curve25519 { signature, .. } => Signature::Curve25519(*signature),
            SignatureWithPublicKey::Secp256k1 { signature, .. } => Signature::Secp256k1(*signature),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            SignatureWithPublicKey::Curve25519 { public_key, .. } => PublicKey::Curve25519(*public_key),
            SignatureWithPublicKey::Secp256k1 { public_key, .. } => PublicKey::Secp256k1(*public_key),
        }
    }

    /// Verify against the embedded key. See [`PublicKey::is_valid_signature`].
    pub fn is_valid(&self, message: &[u8]) -> bool {
        self.public_key().is_valid_signature(&self.signature(), message)
    }
}

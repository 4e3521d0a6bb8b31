//! SLIP-0010 hierarchical deterministic key derivation.
//!
//! Paths look like `m/44H/1022H/14H/525H/1460H/0H`; `H` or `'` marks a
//! hardened component. Curve25519 only supports hardened derivation.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::PrimeField as _;
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::slip10::{Curve, PrivateKey};

type HmacSha512 = Hmac<Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;

// ────────────────────────────────────────────────────────────────────────────
// Paths
// ────────────────────────────────────────────────────────────────────────────

/// One component of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HdPathComponent {
    Hardened(u32),
    Normal(u32),
}

impl HdPathComponent {
    /// The index as used in the HMAC input, hardened bit included.
    pub fn index(&self) -> u32 {
        match self {
            HdPathComponent::Hardened(i) => i | HARDENED_OFFSET,
            HdPathComponent::Normal(i) => *i,
        }
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, HdPathComponent::Hardened(_))
    }
}

impl fmt::Display for HdPathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdPathComponent::Hardened(i) => write!(f, "{}H", i),
            HdPathComponent::Normal(i) => write!(f, "{}", i),
        }
    }
}

/// A parsed derivation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HdPath(Vec<HdPathComponent>);

impl HdPath {
    pub fn new(components: Vec<HdPathComponent>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[HdPathComponent] {
        &self.0
    }

    /// Append one component.
    pub fn child(&self, component: HdPathComponent) -> Self {
        let mut next = self.0.clone();
        next.push(component);
        Self(next)
    }
}

impl FromStr for HdPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => return Err(CoreError::InvalidDerivationPath(s.to_owned())),
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(['H', 'h', '\'']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| CoreError::InvalidDerivationPath(s.to_owned()))?;
            if index >= HARDENED_OFFSET {
                return Err(CoreError::InvalidDerivationPath(s.to_owned()));
            }
            components.push(if hardened {
                HdPathComponent::Hardened(index)
            } else {
                HdPathComponent::Normal(index)
            });
        }
        Ok(Self(components))
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.0 {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extended keys
// ────────────────────────────────────────────────────────────────────────────

/// A private key together with its chain code.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: PrivateKey,
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Master key from a seed.
    pub fn master(curve: Curve, seed: &[u8]) -> Result<Self> {
        let hmac_key: &[u8] = match curve {
            Curve::Curve25519 => b"ed25519 seed",
            Curve::Secp256k1 => b"Bitcoin seed",
        };

        let mut i = hmac_sha512(hmac_key, &[seed])?;
        loop {
            let (il, ir) = split_halves(&i);
            match curve {
                Curve::Curve25519 => {
                    return Ok(Self {
                        private_key: PrivateKey::from_bytes(curve, &il)?,
                        chain_code: ir,
                    })
                }
                Curve::Secp256k1 => {
                    if let Some(scalar) = secp256k1_scalar(&il) {
                        if !bool::from(scalar.is_zero()) {
                            return Ok(Self {
                                private_key: PrivateKey::from_bytes(curve, &il)?,
                                chain_code: ir,
                            });
                        }
                    }
                    i = hmac_sha512(hmac_key, &[&i])?;
                }
            }
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn curve(&self) -> Curve {
        self.private_key.curve()
    }

    /// Derive one child.
    pub fn derive_child(&self, component: HdPathComponent) -> Result<Self> {
        let index = component.index();
        let index_bytes = index.to_be_bytes();

        match &self.private_key {
            PrivateKey::Curve25519(key) => {
                if !component.is_hardened() {
                    return Err(CoreError::NonHardenedCurve25519(index));
                }
                let i = hmac_sha512(&self.chain_code, &[&[0u8], &key.to_bytes(), &index_bytes])?;
                let (il, ir) = split_halves(&i);
                Ok(Self {
                    private_key: PrivateKey::from_bytes(Curve::Curve25519, &il)?,
                    chain_code: ir,
                })
            }
            PrivateKey::Secp256k1(key) => {
                let parent = secp256k1_scalar(&self.private_key.to_bytes())
                    .ok_or(CoreError::InvalidPrivateKey)?;

                let mut i = if component.is_hardened() {
                    let parent_bytes = self.private_key.to_bytes();
                    hmac_sha512(&self.chain_code, &[&[0u8], &parent_bytes, &index_bytes])?
                } else {
                    let point = key.verifying_key().to_encoded_point(true);
                    hmac_sha512(&self.chain_code, &[point.as_bytes(), &index_bytes])?
                };

                loop {
                    let (il, ir) = split_halves(&i);
                    if let Some(tweak) = secp256k1_scalar(&il) {
                        let child = tweak + parent;
                        if !bool::from(child.is_zero()) {
                            let mut bytes = [0u8; 32];
                            bytes.copy_from_slice(&child.to_repr());
                            return Ok(Self {
                                private_key: PrivateKey::from_bytes(Curve::Secp256k1, &bytes)?,
                                chain_code: ir,
                            });
                        }
                    }
                    i = hmac_sha512(&self.chain_code, &[&[1u8], &ir, &index_bytes])?;
                }
            }
        }
    }

    /// Derive along every component of `path`.
    pub fn derive_path(&self, path: &HdPath) -> Result<Self> {
        path.components()
            .iter()
            .try_fold(self.clone(), |key, component| key.derive_child(*component))
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("curve", &self.curve())
            .field("public_key", &self.private_key.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64]> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| CoreError::InvalidDerivationPath(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split_halves(i: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}

/// `None` when `bytes` is not below the group order.
fn secp256k1_scalar(bytes: &[u8; 32]) -> Option<k256::Scalar> {
    Option::from(k256::Scalar::from_repr(k256::FieldBytes::clone_from_slice(bytes)))
}

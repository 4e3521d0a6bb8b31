//! Connection passwords and the collection of paired peer links.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::error::{CoreError, Result};

/// The 32-byte secret identifying an established peer link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionPassword([u8; 32]);

impl ConnectionPassword {
    pub const LENGTH: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Validate and wrap a byte slice. Anything but 32 bytes is rejected.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::InvalidConnectionPassword(format!(
                "expected {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s).map_err(|e| CoreError::InvalidConnectionPassword(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Debug for ConnectionPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionPassword({}…)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ConnectionPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex()[..8])
    }
}

impl std::str::FromStr for ConnectionPassword {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for ConnectionPassword {
    type Error = CoreError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::try_from_slice(bytes)
    }
}

impl Serialize for ConnectionPassword {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ConnectionPassword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A paired peer. Identity is the connection password alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct P2PLink {
    pub connection_password: ConnectionPassword,
    pub display_name: String,
}

impl P2PLink {
    pub fn new(connection_password: ConnectionPassword, display_name: impl Into<String>) -> Self {
        Self {
            connection_password,
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for P2PLink {
    fn eq(&self, other: &Self) -> bool {
        self.connection_password == other.connection_password
    }
}

impl Eq for P2PLink {}

impl Hash for P2PLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.connection_password.hash(state);
    }
}

/// Insertion-ordered links, unique by connection password.
///
/// Deserializing an array that repeats a password fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct P2PLinks(Vec<P2PLink>);

impl P2PLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `link` unless its password is already present.
    ///
    /// Returns the inserted link, or `None` for a duplicate.
    pub fn append(&mut self, link: P2PLink) -> Option<&P2PLink> {
        if self.contains(&link.connection_password) {
            return None;
        }
        self.0.push(link);
        self.0.last()
    }

    /// Remove and return the link with `password`.
    pub fn remove(&mut self, password: &ConnectionPassword) -> Option<P2PLink> {
        let pos = self.0.iter().position(|l| &l.connection_password == password)?;
        Some(self.0.remove(pos))
    }

    pub fn get(&self, password: &ConnectionPassword) -> Option<&P2PLink> {
        self.0.iter().find(|l| &l.connection_password == password)
    }

    pub fn contains(&self, password: &ConnectionPassword) -> bool {
        self.get(password).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P2PLink> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<usize> for P2PLinks {
    type Output = P2PLink;

    fn index(&self, index: usize) -> &P2PLink {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a P2PLinks {
    type Item = &'a P2PLink;
    type IntoIter = std::slice::Iter<'a, P2PLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<P2PLink> for P2PLinks {
    fn from_iter<I: IntoIterator<Item = P2PLink>>(iter: I) -> Self {
        let mut links = Self::new();
        for link in iter {
            links.append(link);
        }
        links
    }
}

impl<'de> Deserialize<'de> for P2PLinks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<P2PLink>::deserialize(deserializer)?;
        let mut links = Self::new();
        for link in raw {
            let password = link.connection_password;
            if links.append(link).is_none() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate connection password {}",
                    password
                )));
            }
        }
        Ok(links)
    }
}

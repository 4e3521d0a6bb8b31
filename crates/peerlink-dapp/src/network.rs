//! Ledger network identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A one-byte ledger network ID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u8);

impl NetworkId {
    pub const MAINNET: Self = Self(0x01);
    pub const STOKENET: Self = Self(0x02);
    pub const ADAPANET: Self = Self(0x0a);
    pub const NEBUNET: Self = Self(0x0b);
    pub const KISHARNET: Self = Self(0x0c);
    pub const ANSHARNET: Self = Self(0x0d);
    pub const ZABANET: Self = Self(0x0e);
    pub const ENKINET: Self = Self(0x21);
    pub const HAMMUNET: Self = Self(0x22);
    pub const LOCALNET: Self = Self(0xf0);
    pub const INTEGRATION_TESTNET: Self = Self(0xf1);
    pub const SIMULATOR: Self = Self(0xf2);

    pub const fn from_u8(id: u8) -> Self {
        Self(id)
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Suffix appended to entity HRPs, e.g. `rdx` in `account_rdx`.
    ///
    /// Test networks without a dedicated suffix use `tdx_<hex id>_`.
    pub fn hrp_suffix(&self) -> String {
        match *self {
            Self::MAINNET => "rdx".to_owned(),
            Self::LOCALNET => "loc".to_owned(),
            Self::INTEGRATION_TESTNET => "test".to_owned(),
            Self::SIMULATOR => "sim".to_owned(),
            Self(id) => format!("tdx_{:x}_", id),
        }
    }

    /// Inverse of [`hrp_suffix`](Self::hrp_suffix).
    pub fn from_hrp_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "rdx" => Some(Self::MAINNET),
            "loc" => Some(Self::LOCALNET),
            "test" => Some(Self::INTEGRATION_TESTNET),
            "sim" => Some(Self::SIMULATOR),
            other => {
                let hex = other.strip_prefix("tdx_")?.strip_suffix('_')?;
                if hex.is_empty() || hex.len() > 2 || hex.chars().any(|c| c.is_ascii_uppercase()) {
                    return None;
                }
                let id = u8::from_str_radix(hex, 16).ok()?;
                // Suffixes are canonical: no leading zeros.
                (format!("{:x}", id) == hex).then_some(Self(id))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Self::MAINNET => "mainnet",
            Self::STOKENET => "stokenet",
            Self::ADAPANET => "adapanet",
            Self::NEBUNET => "nebunet",
            Self::KISHARNET => "kisharnet",
            Self::ANSHARNET => "ansharnet",
            Self::ZABANET => "zabanet",
            Self::ENKINET => "enkinet",
            Self::HAMMUNET => "hammunet",
            Self::LOCALNET => "localnet",
            Self::INTEGRATION_TESTNET => "inttestnet",
            Self::SIMULATOR => "simulator",
            _ => "unnamed",
        }
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({:#04x})", self.0)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

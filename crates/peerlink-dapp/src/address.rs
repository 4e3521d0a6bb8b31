//! Bech32m account addresses used as dApp definitions.

use std::fmt;
use std::str::FromStr;

use bech32::primitives::decode::CheckedHrpstring;
use bech32::Bech32m;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddressError;
use crate::network::NetworkId;

const ACCOUNT_HRP_PREFIX: &str = "account_";

/// Node ID length: one entity type byte plus a 29-byte hash.
pub const ADDRESS_PAYLOAD_LENGTH: usize = 30;

/// Entity type bytes that identify account components.
const ACCOUNT_ENTITY_TYPES: [u8; 3] = [
    0xc1, // global account
    0xd1, // virtual secp256k1 account
    0x51, // virtual ed25519 account
];

/// A validated dApp definition address.
///
/// Keeps the original string (it is what the dApp sent and what is echoed
/// back) alongside the network encoded in its HRP.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DappDefinitionAddress {
    address: String,
    network_id: NetworkId,
}

impl DappDefinitionAddress {
    /// Validate a bech32m account address.
    pub fn validating(raw: &str) -> Result<Self, AddressError> {
        let checked = CheckedHrpstring::new::<Bech32m>(raw)
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        let hrp = checked.hrp().to_lowercase();
        let suffix = hrp
            .strip_prefix(ACCOUNT_HRP_PREFIX)
            .ok_or_else(|| AddressError::NotAnAccount(hrp.clone()))?;
        let network_id = NetworkId::from_hrp_suffix(suffix)
            .ok_or_else(|| AddressError::UnknownNetwork(hrp.clone()))?;

        let payload: Vec<u8> = checked.byte_iter().collect();
        if payload.len() != ADDRESS_PAYLOAD_LENGTH {
            return Err(AddressError::InvalidLength(payload.len()));
        }
        let entity_type = payload[0];
        if !ACCOUNT_ENTITY_TYPES.contains(&entity_type) {
            return Err(AddressError::InvalidEntityType(entity_type));
        }

        Ok(Self {
            address: raw.to_owned(),
            network_id,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }
}

impl FromStr for DappDefinitionAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validating(s)
    }
}

impl fmt::Debug for DappDefinitionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DappDefinitionAddress({})", self.address)
    }
}

impl fmt::Display for DappDefinitionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl Serialize for DappDefinitionAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address)
    }
}

impl<'de> Deserialize<'de> for DappDefinitionAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::validating(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIM: &str = "account_sim1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya744cve475w0q";
    const HAMMUNET: &str =
        "account_tdx_21_12yth59wfyl8e4axupym0c96g9heuf5j06lv2lgc2cuapzlmj6alzzn";
    const MAINNET: &str = "account_rdx1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya744cvet4t0lu";
    const STOKENET: &str =
        "account_tdx_2_1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya744cvec6xavx";

    #[test]
    fn test_valid_addresses() {
        let sim = DappDefinitionAddress::validating(SIM).unwrap();
        assert_eq!(sim.network_id(), NetworkId::SIMULATOR);
        assert_eq!(sim.address(), SIM);

        let hammunet = DappDefinitionAddress::validating(HAMMUNET).unwrap();
        assert_eq!(hammunet.network_id(), NetworkId::HAMMUNET);

        let mainnet = DappDefinitionAddress::validating(MAINNET).unwrap();
        assert_eq!(mainnet.network_id(), NetworkId::MAINNET);

        let stokenet = DappDefinitionAddress::validating(STOKENET).unwrap();
        assert_eq!(stokenet.network_id(), NetworkId::STOKENET);
    }

    #[test]
    fn test_rejects_non_account_hrp() {
        let err = DappDefinitionAddress::validating(
            "resource_sim1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya744cvefc2ln4",
        )
        .unwrap_err();
        assert_eq!(err, AddressError::NotAnAccount("resource_sim".to_owned()));
    }

    #[test]
    fn test_rejects_bech32_checksum() {
        let err = DappDefinitionAddress::validating(
            "account_sim1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya744cveqzyz2z",
        )
        .unwrap_err();
        assert!(matches!(err, AddressError::InvalidEncoding(_)));
    }

    #[test]
    fn test_rejects_short_payload() {
        let err = DappDefinitionAddress::validating(
            "account_sim1cyvgx33089ukm2pl97pv4max0x40ruvfy4lt60yvya74c26zfa",
        )
        .unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength(_)));
    }

    #[test]
    fn test_rejects_single_character_typo() {
        let typo = SIM.replacen("cyvgx", "cyvgy", 1);
        assert!(DappDefinitionAddress::validating(&typo).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(DappDefinitionAddress::validating("").is_err());
        assert!(DappDefinitionAddress::validating("not an address").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let json = format!("\"{}\"", HAMMUNET);
        let addr: DappDefinitionAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), json);

        assert!(serde_json::from_str::<DappDefinitionAddress>("\"account_nope\"").is_err());
    }
}

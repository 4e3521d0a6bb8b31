//! Error types for the dApp module.

use thiserror::Error;

/// Why a string is not a valid dApp definition address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("not a bech32m string: {0}")]
    InvalidEncoding(String),

    #[error("not an account address (hrp {0})")]
    NotAnAccount(String),

    #[error("unknown network suffix in hrp {0}")]
    UnknownNetwork(String),

    #[error("address payload must be 30 bytes, got {0}")]
    InvalidLength(usize),

    #[error("entity type {0:#04x} is not an account")]
    InvalidEntityType(u8),
}

/// The wallet could not verify that the dApp is who it claims to be.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dApp verification failed: {0}")]
pub struct DappVerificationError(pub String);

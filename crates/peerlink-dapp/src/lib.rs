//! # PeerLink dApp
//!
//! dApp interaction requests and their validation.
//!
//! ## Overview
//!
//! A request reaches the wallet as the content of a reassembled data channel
//! message. [`IncomingRequest::from_message`] decodes it, and
//! [`RequestValidator::validate`] turns it into either a
//! [`RequestEnvelope`] with typed origin and dApp definition address, or an
//! [`InvalidRequestReason`] the wallet reports back to the dApp.
//!
//! ## Validation Order
//!
//! Checks stop at the first failure:
//!
//! 1. the request decoded
//! 2. interaction version is supported
//! 3. network matches the wallet's current network
//! 4. dApp definition address is a valid account address
//! 5. requested number of accounts is sensible
//! 6. origin is a non-empty URL
//! 7. the dApp passes verification (skipped in developer mode)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use peerlink_dapp::{IncomingRequest, RequestValidator, ValidatedRequest, WalletContext};
//!
//! async fn example(ctx: &dyn WalletContext, incoming: IncomingRequest) {
//!     match RequestValidator::default().validate(ctx, incoming).await {
//!         ValidatedRequest::Valid(envelope) => println!("{}", envelope.request.interaction_id),
//!         ValidatedRequest::Invalid { reason, .. } => println!("rejected: {}", reason),
//!     }
//! }
//! ```

pub mod address;
pub mod error;
pub mod network;
pub mod request;
pub mod validation;

pub use address::DappDefinitionAddress;
pub use error::{AddressError, DappVerificationError};
pub use network::NetworkId;
pub use request::{
    AccountsRequestItem, AuthRequestItem, AuthorizedRequestItems, IncomingRequest, InteractionId,
    NumberOfAccounts, PersonaDataRequestItem, Quantifier, RequestItems, RequestMetadataUnvalidated,
    RequestUnvalidated, RequestedQuantity, ResetRequestItem, Route, SendTransactionItem,
    TransactionItems, UnauthorizedRequestItems, WALLET_INTERACTION_VERSION,
};
pub use validation::{
    BadContent, DappOrigin, InvalidRequestReason, Request, RequestEnvelope, RequestMetadata,
    RequestValidator, ValidatedRequest, WalletContext, WalletInteractionErrorType,
    WalletInteractionFailureResponse,
};

//! Request validation.
//!
//! [`RequestValidator::validate`] never fails: every rejected request comes
//! back as [`ValidatedRequest::Invalid`] with the reason, which the caller
//! turns into a [`WalletInteractionFailureResponse`] for the dApp.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::address::DappDefinitionAddress;
use crate::error::DappVerificationError;
use crate::network::NetworkId;
use crate::request::{
    IncomingRequest, InteractionId, RequestItems, RequestUnvalidated, Route,
    WALLET_INTERACTION_VERSION,
};

// ────────────────────────────────────────────────────────────────────────────
// Wallet context
// ────────────────────────────────────────────────────────────────────────────

/// Wallet state the validator consults.
#[async_trait]
pub trait WalletContext: Send + Sync {
    /// Network of the currently active profile.
    async fn current_network_id(&self) -> NetworkId;

    /// Developer mode skips dApp verification.
    async fn is_developer_mode_enabled(&self) -> bool;

    /// Check that the dApp definition vouches for the origin.
    async fn verify_dapp(&self, metadata: &RequestMetadata) -> Result<(), DappVerificationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Validated types
// ────────────────────────────────────────────────────────────────────────────

/// The web origin a request claims to come from.
#[derive(Clone, PartialEq, Eq)]
pub struct DappOrigin {
    raw: String,
    url: Url,
}

impl DappOrigin {
    /// Accepts any non-empty URL. A scheme-less origin such as
    /// `radixdlt.dashboard.com` is read as an `https` host.
    pub fn validating(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&format!("https://{}", raw)).ok()?
            }
            Err(_) => return None,
        };
        Some(Self {
            raw: raw.to_owned(),
            url,
        })
    }

    /// The string exactly as the dApp sent it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for DappOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DappOrigin({})", self.raw)
    }
}

impl fmt::Display for DappOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub version: u32,
    pub network_id: NetworkId,
    pub origin: DappOrigin,
    pub dapp_definition_address: DappDefinitionAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub interaction_id: InteractionId,
    pub items: RequestItems,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub route: Route,
    pub request: Request,
}

/// Outcome of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedRequest {
    Valid(RequestEnvelope),
    Invalid {
        route: Route,
        /// Absent when the request never decoded.
        interaction_id: Option<InteractionId>,
        reason: InvalidRequestReason,
    },
}

impl ValidatedRequest {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn route(&self) -> &Route {
        match self {
            Self::Valid(envelope) => &envelope.route,
            Self::Invalid { route, .. } => route,
        }
    }

    /// The failure to send back to the dApp, if there is anyone to answer.
    pub fn failure_response(&self) -> Option<WalletInteractionFailureResponse> {
        let Self::Invalid {
            interaction_id: Some(interaction_id),
            reason,
            ..
        } = self
        else {
            return None;
        };
        Some(WalletInteractionFailureResponse {
            interaction_id: interaction_id.clone(),
            error: reason.interaction_failure()?,
            message: Some(reason.to_string()),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Failure reasons
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BadContent {
    #[error("number of accounts invalid")]
    NumberOfAccountsInvalid,
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequestReason {
    #[error("transport error: {0}")]
    P2pError(String),

    #[error("incompatible version: dApp sent {sent}, wallet uses {uses}")]
    IncompatibleVersion { sent: u32, uses: u32 },

    #[error("wrong network: dApp sent {sent}, wallet uses {uses}")]
    WrongNetworkId { sent: NetworkId, uses: NetworkId },

    #[error("invalid dApp definition address: {0}")]
    InvalidDappDefinitionAddress(String),

    #[error("bad content: {0}")]
    BadContent(BadContent),

    #[error("invalid origin: {0:?}")]
    InvalidOrigin(String),

    #[error(transparent)]
    DappValidationError(DappVerificationError),
}

impl InvalidRequestReason {
    /// The error reported to the dApp. Transport errors have no wire
    /// counterpart since there is no interaction to answer.
    pub fn interaction_failure(&self) -> Option<WalletInteractionErrorType> {
        use WalletInteractionErrorType as E;
        Some(match self {
            Self::P2pError(_) => return None,
            Self::IncompatibleVersion { .. } => E::IncompatibleVersion,
            Self::WrongNetworkId { .. } => E::WrongNetwork,
            Self::InvalidDappDefinitionAddress(_) => E::UnknownDappDefinitionAddress,
            Self::InvalidOrigin(_) => E::InvalidOriginUrl,
            Self::DappValidationError(_) => E::UnknownDappDefinitionAddress,
            Self::BadContent(_) => E::InvalidRequest,
        })
    }
}

/// Wire-level error types of a failed wallet interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletInteractionErrorType {
    RejectedByUser,
    WrongNetwork,
    FailedToPrepareTransaction,
    FailedToCompileTransaction,
    FailedToSignTransaction,
    FailedToSubmitTransaction,
    FailedToPollSubmittedTransaction,
    SubmittedTransactionWasDuplicate,
    SubmittedTransactionHasFailedTransactionStatus,
    SubmittedTransactionHasRejectedTransactionStatus,
    WrongAccountType,
    UnknownWebsite,
    #[serde(rename = "invalidOriginURL")]
    InvalidOriginUrl,
    RadixJsonNotFound,
    UnknownDappDefinitionAddress,
    InvalidPersona,
    InvalidRequest,
    IncompatibleVersion,
    FailedToSignAuthChallenge,
}

/// `{"discriminator": "failure", "interactionId": ..., "error": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename = "failure", rename_all = "camelCase")]
pub struct WalletInteractionFailureResponse {
    pub interaction_id: InteractionId,
    pub error: WalletInteractionErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validator
// ────────────────────────────────────────────────────────────────────────────

/// Validates incoming requests against the wallet's state.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    pub supported_version: u32,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self {
            supported_version: WALLET_INTERACTION_VERSION,
        }
    }
}

impl RequestValidator {
    pub fn new(supported_version: u32) -> Self {
        Self { supported_version }
    }

    /// Run every check in order, stopping at the first failure.
    pub async fn validate(
        &self,
        ctx: &dyn WalletContext,
        incoming: IncomingRequest,
    ) -> ValidatedRequest {
        let IncomingRequest { route, result } = incoming;

        let request = match result {
            Ok(request) => request,
            Err(description) => {
                return ValidatedRequest::Invalid {
                    route,
                    interaction_id: None,
                    reason: InvalidRequestReason::P2pError(description),
                };
            }
        };

        let interaction_id = request.interaction_id.clone();
        match self.check(ctx, request).await {
            Ok(request) => {
                tracing::debug!(interaction_id = %interaction_id, "request valid");
                ValidatedRequest::Valid(RequestEnvelope { route, request })
            }
            Err(reason) => {
                tracing::warn!(interaction_id = %interaction_id, reason = %reason, "request invalid");
                ValidatedRequest::Invalid {
                    route,
                    interaction_id: Some(interaction_id),
                    reason,
                }
            }
        }
    }

    async fn check(
        &self,
        ctx: &dyn WalletContext,
        request: RequestUnvalidated,
    ) -> Result<Request, InvalidRequestReason> {
        let RequestUnvalidated {
            interaction_id,
            items,
            metadata,
        } = request;

        if metadata.version != self.supported_version {
            return Err(InvalidRequestReason::IncompatibleVersion {
                sent: metadata.version,
                uses: self.supported_version,
            });
        }

        let current = ctx.current_network_id().await;
        if metadata.network_id != current {
            return Err(InvalidRequestReason::WrongNetworkId {
                sent: metadata.network_id,
                uses: current,
            });
        }

        let dapp_definition_address =
            DappDefinitionAddress::validating(&metadata.dapp_definition_address).map_err(|e| {
                tracing::debug!(error = %e, "dApp definition address rejected");
                InvalidRequestReason::InvalidDappDefinitionAddress(
                    metadata.dapp_definition_address.clone(),
                )
            })?;

        if items
            .requested_number_of_accounts()
            .iter()
            .any(|n| !n.is_valid())
        {
            return Err(InvalidRequestReason::BadContent(
                BadContent::NumberOfAccountsInvalid,
            ));
        }

        let origin = DappOrigin::validating(&metadata.origin)
            .ok_or_else(|| InvalidRequestReason::InvalidOrigin(metadata.origin.clone()))?;

        let metadata = RequestMetadata {
            version: metadata.version,
            network_id: metadata.network_id,
            origin,
            dapp_definition_address,
        };

        if !ctx.is_developer_mode_enabled().await {
            ctx.verify_dapp(&metadata)
                .await
                .map_err(InvalidRequestReason::DappValidationError)?;
        }

        Ok(Request {
            interaction_id,
            items,
            metadata,
        })
    }
}

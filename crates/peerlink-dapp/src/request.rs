//! Wire model of dApp interaction requests, before validation.
//!
//! Requests are JSON documents carried as the content of a reassembled data
//! channel message:
//!
//! ```json
//! {
//!   "interactionId": "ed987de8-fc30-40d0-81ea-e3eef117a2cc",
//!   "items": { "discriminator": "authorizedRequest", "auth": { "discriminator": "loginWithoutChallenge" } },
//!   "metadata": {
//!     "version": 1,
//!     "networkId": 34,
//!     "origin": "https://dashboard.example.com",
//!     "dAppDefinitionAddress": "account_tdx_21_12yth59wfyl8e4axupym0c96g9heuf5j06lv2lgc2cuapzlmj6alzzn"
//!   }
//! }
//! ```

use std::fmt;

use peerlink_core::{AssembledMessage, ConnectionPassword, MessageId};
use serde::{Deserialize, Serialize};

use crate::network::NetworkId;

/// Interaction protocol version this wallet speaks.
pub const WALLET_INTERACTION_VERSION: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers and routing
// ────────────────────────────────────────────────────────────────────────────

/// dApp-chosen ID correlating a request with the wallet's response.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(String);

impl InteractionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InteractionId({})", self.0)
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a request came from, so the response can go back the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// A paired browser extension, over its data channel.
    Rtc {
        connection_password: ConnectionPassword,
        message_id: MessageId,
    },
    /// Raised by the wallet itself.
    Wallet,
}

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// A decoded request whose metadata has not been checked yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUnvalidated {
    pub interaction_id: InteractionId,
    pub items: RequestItems,
    pub metadata: RequestMetadataUnvalidated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadataUnvalidated {
    pub version: u32,
    pub network_id: NetworkId,
    pub origin: String,
    #[serde(rename = "dAppDefinitionAddress")]
    pub dapp_definition_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "camelCase")]
pub enum RequestItems {
    UnauthorizedRequest(UnauthorizedRequestItems),
    AuthorizedRequest(AuthorizedRequestItems),
    Transaction(TransactionItems),
}

impl RequestItems {
    /// Every account count the request asks for, one-time and ongoing.
    pub fn requested_number_of_accounts(&self) -> Vec<&NumberOfAccounts> {
        match self {
            Self::UnauthorizedRequest(items) => items
                .one_time_accounts
                .iter()
                .map(|a| &a.number_of_accounts)
                .collect(),
            Self::AuthorizedRequest(items) => items
                .one_time_accounts
                .iter()
                .chain(items.ongoing_accounts.iter())
                .map(|a| &a.number_of_accounts)
                .collect(),
            Self::Transaction(_) => Vec::new(),
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnauthorizedRequestItems {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_accounts: Option<AccountsRequestItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_persona_data: Option<PersonaDataRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedRequestItems {
    pub auth: AuthRequestItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<ResetRequestItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ongoing_accounts: Option<AccountsRequestItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ongoing_persona_data: Option<PersonaDataRequestItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_accounts: Option<AccountsRequestItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_persona_data: Option<PersonaDataRequestItem>,
}

impl AuthorizedRequestItems {
    pub fn new(auth: AuthRequestItem) -> Self {
        Self {
            auth,
            reset: None,
            ongoing_accounts: None,
            ongoing_persona_data: None,
            one_time_accounts: None,
            one_time_persona_data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItems {
    pub send: SendTransactionItem,
}

// ────────────────────────────────────────────────────────────────────────────
// Items
// ────────────────────────────────────────────────────────────────────────────

/// How the dApp wants the user to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "camelCase")]
pub enum AuthRequestItem {
    LoginWithoutChallenge,
    LoginWithChallenge {
        challenge: String,
    },
    UsePersona {
        #[serde(rename = "identityAddress")]
        identity_address: String,
    },
}

/// Ask the wallet to forget previously shared ongoing data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestItem {
    pub accounts: bool,
    pub persona_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsRequestItem {
    pub number_of_accounts: NumberOfAccounts,
    /// Hex-encoded 32-byte challenge the chosen accounts must sign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDataRequestItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_requesting_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_requested_email_addresses: Option<RequestedQuantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_requested_phone_numbers: Option<RequestedQuantity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantifier {
    Exactly,
    AtLeast,
}

/// `exactly N` or `at least N` of something.
///
/// `quantity` is signed on the wire; negative values decode and are then
/// rejected by [`is_valid`](Self::is_valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestedQuantity {
    pub quantifier: Quantifier,
    pub quantity: i32,
}

pub type NumberOfAccounts = RequestedQuantity;

impl RequestedQuantity {
    pub fn exactly(quantity: i32) -> Self {
        Self {
            quantifier: Quantifier::Exactly,
            quantity,
        }
    }

    pub fn at_least(quantity: i32) -> Self {
        Self {
            quantifier: Quantifier::AtLeast,
            quantity,
        }
    }

    /// `exactly N` needs `N > 0`, `at least N` needs `N >= 0`.
    pub fn is_valid(&self) -> bool {
        match self.quantifier {
            Quantifier::Exactly => self.quantity > 0,
            Quantifier::AtLeast => self.quantity >= 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionItem {
    pub version: u32,
    pub transaction_manifest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blobs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Incoming
// ────────────────────────────────────────────────────────────────────────────

/// A request as handed to the validator: either decoded, or the reason the
/// transport could not produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub route: Route,
    pub result: Result<RequestUnvalidated, String>,
}

impl IncomingRequest {
    pub fn new(route: Route, request: RequestUnvalidated) -> Self {
        Self {
            route,
            result: Ok(request),
        }
    }

    pub fn failed(route: Route, description: impl Into<String>) -> Self {
        Self {
            route,
            result: Err(description.into()),
        }
    }

    /// Decode the JSON request carried by a reassembled message.
    pub fn from_message(route: Route, message: &AssembledMessage) -> Self {
        let result = serde_json::from_slice(message.message_content()).map_err(|e| {
            tracing::warn!(
                message_id = %message.id_of_chunks(),
                error = %e,
                "undecodable dApp request"
            );
            e.to_string()
        });
        Self { route, result }
    }

    /// Convenience for requests arriving over a data channel.
    pub fn from_rtc(connection_password: ConnectionPassword, message: &AssembledMessage) -> Self {
        let route = Route::Rtc {
            connection_password,
            message_id: message.id_of_chunks().clone(),
        };
        Self::from_message(route, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDRESS: &str = "account_tdx_21_12yth59wfyl8e4axupym0c96g9heuf5j06lv2lgc2cuapzlmj6alzzn";

    fn metadata() -> serde_json::Value {
        json!({
            "version": 1,
            "networkId": 34,
            "origin": "https://dashboard-pr-126.rdx-works-main.extratools.works",
            "dAppDefinitionAddress": ADDRESS,
        })
    }

    #[test]
    fn test_decode_unauthorized_request() {
        let raw = json!({
            "interactionId": "791638de-cefa-43a8-9319-aa31c582fc7d",
            "items": {
                "discriminator": "unauthorizedRequest",
                "oneTimeAccounts": {
                    "numberOfAccounts": { "quantifier": "exactly", "quantity": 2 },
                    "challenge": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
                },
                "oneTimePersonaData": {
                    "isRequestingName": true,
                    "numberOfRequestedEmailAddresses": { "quantifier": "atLeast", "quantity": 1 },
                    "numberOfRequestedPhoneNumbers": { "quantifier": "exactly", "quantity": 1 },
                },
            },
            "metadata": metadata(),
        });

        let request: RequestUnvalidated = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(request.interaction_id.as_str(), "791638de-cefa-43a8-9319-aa31c582fc7d");
        assert_eq!(request.metadata.network_id, NetworkId::HAMMUNET);
        assert_eq!(request.metadata.dapp_definition_address, ADDRESS);

        let RequestItems::UnauthorizedRequest(items) = &request.items else {
            panic!("expected unauthorized request");
        };
        let accounts = items.one_time_accounts.as_ref().unwrap();
        assert_eq!(accounts.number_of_accounts, RequestedQuantity::exactly(2));
        let persona = items.one_time_persona_data.as_ref().unwrap();
        assert_eq!(persona.is_requesting_name, Some(true));
        assert_eq!(
            persona.number_of_requested_email_addresses,
            Some(RequestedQuantity::at_least(1))
        );

        assert_eq!(serde_json::to_value(&request).unwrap(), raw);
    }

    #[test]
    fn test_decode_transaction_request() {
        let raw = json!({
            "interactionId": "ed987de8-fc30-40d0-81ea-e3eef117a2cc",
            "items": {
                "discriminator": "transaction",
                "send": { "version": 1, "transactionManifest": "", "message": "MSG" },
            },
            "metadata": metadata(),
        });

        let request: RequestUnvalidated = serde_json::from_value(raw).unwrap();
        let RequestItems::Transaction(items) = &request.items else {
            panic!("expected transaction");
        };
        assert_eq!(items.send.message.as_deref(), Some("MSG"));
        assert!(items.send.blobs.is_none());
        assert!(request.items.requested_number_of_accounts().is_empty());
    }

    #[test]
    fn test_decode_auth_variants() {
        let cases = [
            (json!({ "discriminator": "loginWithoutChallenge" }), AuthRequestItem::LoginWithoutChallenge),
            (
                json!({ "discriminator": "loginWithChallenge", "challenge": "deadbeef" }),
                AuthRequestItem::LoginWithChallenge { challenge: "deadbeef".into() },
            ),
            (
                json!({ "discriminator": "usePersona", "identityAddress": "identity_tdx_21_1abc" }),
                AuthRequestItem::UsePersona { identity_address: "identity_tdx_21_1abc".into() },
            ),
        ];

        for (auth, expected) in cases {
            let raw = json!({
                "interactionId": "id",
                "items": { "discriminator": "authorizedRequest", "auth": auth },
                "metadata": metadata(),
            });
            let request: RequestUnvalidated = serde_json::from_value(raw).unwrap();
            let RequestItems::AuthorizedRequest(items) = request.items else {
                panic!("expected authorized request");
            };
            assert_eq!(items.auth, expected);
        }
    }

    #[test]
    fn test_requested_accounts_covers_one_time_and_ongoing() {
        let mut items = AuthorizedRequestItems::new(AuthRequestItem::LoginWithoutChallenge);
        items.one_time_accounts = Some(AccountsRequestItem {
            number_of_accounts: RequestedQuantity::exactly(1),
            challenge: None,
        });
        items.ongoing_accounts = Some(AccountsRequestItem {
            number_of_accounts: RequestedQuantity::at_least(0),
            challenge: None,
        });

        let binding = RequestItems::AuthorizedRequest(items);
        let counts = binding.requested_number_of_accounts();
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_quantity_validity() {
        assert!(RequestedQuantity::exactly(1).is_valid());
        assert!(!RequestedQuantity::exactly(0).is_valid());
        assert!(!RequestedQuantity::exactly(-1).is_valid());
        assert!(RequestedQuantity::at_least(0).is_valid());
        assert!(!RequestedQuantity::at_least(-1).is_valid());
    }

    #[test]
    fn test_from_message() {
        let body = json!({
            "interactionId": "id",
            "items": { "discriminator": "unauthorizedRequest" },
            "metadata": metadata(),
        });
        let message = AssembledMessage::new(serde_json::to_vec(&body).unwrap(), MessageId::new("m1"));
        let password = ConnectionPassword::from_bytes([0xde; 32]);

        let incoming = IncomingRequest::from_rtc(password, &message);
        assert_eq!(
            incoming.route,
            Route::Rtc { connection_password: password, message_id: MessageId::new("m1") }
        );
        assert!(incoming.result.is_ok());

        let garbage = AssembledMessage::new(b"{not json".to_vec(), MessageId::new("m2"));
        let incoming = IncomingRequest::from_message(Route::Wallet, &garbage);
        assert!(incoming.result.is_err());
    }
}

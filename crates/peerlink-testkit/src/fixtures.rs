//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use peerlink_channel::{ChannelConfig, ChannelStreams, DataChannelClient, MemoryChannel};
use peerlink_core::{ConnectionPassword, P2PLink};
use peerlink_dapp::{
    AccountsRequestItem, AuthRequestItem, AuthorizedRequestItems, DappVerificationError,
    InteractionId, NetworkId, RequestItems, RequestMetadata, RequestMetadataUnvalidated,
    RequestUnvalidated, RequestedQuantity, UnauthorizedRequestItems, WalletContext,
    WALLET_INTERACTION_VERSION,
};

/// Account address on Hammunet used throughout the fixtures.
pub const DAPP_DEFINITION_ADDRESS: &str =
    "account_tdx_21_12yth59wfyl8e4axupym0c96g9heuf5j06lv2lgc2cuapzlmj6alzzn";

/// Origin used throughout the fixtures.
pub const DAPP_ORIGIN: &str = "https://dashboard.example.com";

// ────────────────────────────────────────────────────────────────────────────
// Channels
// ────────────────────────────────────────────────────────────────────────────

/// Two clients joined by an in-memory channel.
pub struct ConnectedPair {
    pub wallet: DataChannelClient,
    pub wallet_streams: ChannelStreams,
    pub dapp: DataChannelClient,
    pub dapp_streams: ChannelStreams,
}

impl ConnectedPair {
    /// Must be called inside a tokio runtime.
    pub fn new(config: ChannelConfig) -> Self {
        let (a, b) = MemoryChannel::pair();
        let (wallet, wallet_streams) = DataChannelClient::spawn(Arc::new(a), config.clone());
        let (dapp, dapp_streams) = DataChannelClient::spawn(Arc::new(b), config);
        Self {
            wallet,
            wallet_streams,
            dapp,
            dapp_streams,
        }
    }
}

impl Default for ConnectedPair {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

/// A deterministic link whose password is `[seed; 32]`.
pub fn test_link(seed: u8, display_name: &str) -> P2PLink {
    P2PLink::new(ConnectionPassword::from_bytes([seed; 32]), display_name)
}

// ────────────────────────────────────────────────────────────────────────────
// Wallet context
// ────────────────────────────────────────────────────────────────────────────

/// A configurable [`WalletContext`].
pub struct TestWallet {
    pub network_id: NetworkId,
    pub developer_mode: bool,
    pub verification: Result<(), DappVerificationError>,
    verify_calls: AtomicUsize,
}

impl TestWallet {
    /// On Hammunet, verification succeeds.
    pub fn new() -> Self {
        Self {
            network_id: NetworkId::HAMMUNET,
            developer_mode: false,
            verification: Ok(()),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn on_network(network_id: NetworkId) -> Self {
        Self {
            network_id,
            ..Self::new()
        }
    }

    pub fn rejecting_dapps(reason: &str) -> Self {
        Self {
            verification: Err(DappVerificationError(reason.to_owned())),
            ..Self::new()
        }
    }

    /// How many times dApp verification ran.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl Default for TestWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletContext for TestWallet {
    async fn current_network_id(&self) -> NetworkId {
        self.network_id
    }

    async fn is_developer_mode_enabled(&self) -> bool {
        self.developer_mode
    }

    async fn verify_dapp(&self, _: &RequestMetadata) -> Result<(), DappVerificationError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verification.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Metadata that passes validation against [`TestWallet::new`].
pub fn valid_metadata() -> RequestMetadataUnvalidated {
    RequestMetadataUnvalidated {
        version: WALLET_INTERACTION_VERSION,
        network_id: NetworkId::HAMMUNET,
        origin: DAPP_ORIGIN.to_owned(),
        dapp_definition_address: DAPP_DEFINITION_ADDRESS.to_owned(),
    }
}

/// A login request without challenge.
pub fn login_request(interaction_id: &str) -> RequestUnvalidated {
    RequestUnvalidated {
        interaction_id: InteractionId::new(interaction_id),
        items: RequestItems::AuthorizedRequest(AuthorizedRequestItems::new(
            AuthRequestItem::LoginWithoutChallenge,
        )),
        metadata: valid_metadata(),
    }
}

/// An unauthorized request for `number_of_accounts` one-time accounts.
pub fn one_time_accounts_request(
    interaction_id: &str,
    number_of_accounts: RequestedQuantity,
) -> RequestUnvalidated {
    RequestUnvalidated {
        interaction_id: InteractionId::new(interaction_id),
        items: RequestItems::UnauthorizedRequest(UnauthorizedRequestItems {
            one_time_accounts: Some(AccountsRequestItem {
                number_of_accounts,
                challenge: None,
            }),
            one_time_persona_data: None,
        }),
        metadata: valid_metadata(),
    }
}

/// JSON bytes of a request, as a dApp would send them.
pub fn request_bytes(request: &RequestUnvalidated) -> Vec<u8> {
    serde_json::to_vec(request).unwrap_or_default()
}

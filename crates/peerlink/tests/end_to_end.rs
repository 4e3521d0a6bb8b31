//! A dApp sends requests to a wallet over a paired link; the wallet
//! validates them and answers failures.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use peerlink::channel::{ChannelConfig, ChannelError, MemoryChannel};
use peerlink::core::{
    split, ChunkedMessage, DataChannelMessage, MessageId, Receipt, ReceiveErrorReason,
};
use peerlink::dapp::{
    RequestedQuantity, ValidatedRequest, WalletInteractionErrorType,
    WalletInteractionFailureResponse,
};
use peerlink::{
    DataChannel, LinkManager, PeerLinkConfig, PeerLinkError, RequestValidator, RoutedMessage,
};
use peerlink_testkit::fixtures::{
    login_request, one_time_accounts_request, request_bytes, test_link, TestWallet,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

async fn paired() -> Result<(LinkManager, LinkManager, ReceiverStream<RoutedMessage>)> {
    let (wallet, wallet_inbound) = LinkManager::new(PeerLinkConfig::default());
    let (dapp, _dapp_inbound) = LinkManager::new(PeerLinkConfig::default());
    let link = test_link(0xde, "Chrome");
    wallet.add_link(link.clone()).await;
    dapp.add_link(link.clone()).await;

    let (a, b) = MemoryChannel::pair();
    wallet.attach(&link.connection_password, Arc::new(a)).await?;
    dapp.attach(&link.connection_password, Arc::new(b)).await?;
    Ok((wallet, dapp, wallet_inbound))
}

#[tokio::test]
async fn valid_request_reaches_wallet() -> Result<()> {
    init_tracing();
    let (_wallet, dapp, mut inbound) = paired().await?;
    let password = test_link(0xde, "Chrome").connection_password;

    let request = login_request("interaction-1");
    let message_id = dapp.send_json(&password, &request).await?;

    let routed = inbound.next().await.expect("message routed");
    assert_eq!(routed.connection_password, password);
    assert_eq!(routed.message.id_of_chunks(), &message_id);

    let validated = RequestValidator::default()
        .validate(&TestWallet::new(), routed.to_request())
        .await;
    let ValidatedRequest::Valid(envelope) = validated else {
        panic!("expected valid request");
    };
    assert_eq!(envelope.request.interaction_id.as_str(), "interaction-1");
    Ok(())
}

#[tokio::test]
async fn invalid_request_is_answered_with_failure() -> Result<()> {
    init_tracing();
    let (dapp_side, mut dapp_inbound) = LinkManager::new(PeerLinkConfig::default());
    let (wallet, mut wallet_inbound) = LinkManager::new(PeerLinkConfig::default());
    let link = test_link(0x01, "Firefox");
    let password = link.connection_password;
    wallet.add_link(link.clone()).await;
    dapp_side.add_link(link).await;
    let (a, b) = MemoryChannel::pair();
    wallet.attach(&password, Arc::new(a)).await?;
    dapp_side.attach(&password, Arc::new(b)).await?;

    let request = one_time_accounts_request("bad", RequestedQuantity::exactly(0));
    dapp_side.send_message_confirmed(&password, request_bytes(&request)).await?;

    let routed = wallet_inbound.next().await.expect("message routed");
    let validated = RequestValidator::default()
        .validate(&TestWallet::new(), routed.to_request())
        .await;
    let failure = validated.failure_response().expect("failure response");
    wallet.send_json(&password, &failure).await?;

    let answer = dapp_inbound.next().await.expect("answer routed");
    let response: WalletInteractionFailureResponse =
        serde_json::from_slice(answer.message.message_content())?;
    assert_eq!(response.interaction_id.as_str(), "bad");
    assert_eq!(response.error, WalletInteractionErrorType::InvalidRequest);
    Ok(())
}

#[tokio::test]
async fn undecodable_request_has_no_answer() -> Result<()> {
    init_tracing();
    let (_wallet, dapp, mut inbound) = paired().await?;
    let password = test_link(0xde, "Chrome").connection_password;

    dapp.send_message_confirmed(&password, &b"{\"not\":\"a request\"}"[..]).await?;

    let routed = inbound.next().await.expect("message routed");
    let validated = RequestValidator::default()
        .validate(&TestWallet::new(), routed.to_request())
        .await;
    assert!(!validated.is_valid());
    assert!(validated.failure_response().is_none());
    Ok(())
}

#[tokio::test]
async fn corrupted_message_is_rejected_not_delivered() -> Result<()> {
    init_tracing();
    let (wallet, mut inbound) = LinkManager::new(PeerLinkConfig::default());
    let link = test_link(0x02, "raw");
    let password = link.connection_password;
    wallet.add_link(link).await;

    let (a, raw) = MemoryChannel::pair();
    wallet.attach(&password, Arc::new(a)).await?;

    let mut packets = split(&b"hello world"[..], MessageId::new("bad"));
    if let ChunkedMessage::Chunk(c) = &mut packets[1] {
        c.chunk_data = bytes::Bytes::from_static(b"hello_world");
    }
    for packet in packets {
        raw.send(DataChannelMessage::from(packet).encode()?.into()).await?;
    }

    let reply = raw.recv().await?.expect("receipt");
    match DataChannelMessage::decode(&reply)? {
        DataChannelMessage::Receipt(Receipt::Error(e)) => {
            assert_eq!(e.message_id, MessageId::new("bad"));
            assert_eq!(e.error, ReceiveErrorReason::MessageHashesMismatch);
        }
        other => panic!("unexpected reply {:?}", other),
    }

    let nothing = tokio::time::timeout(Duration::from_millis(50), inbound.next()).await;
    assert!(nothing.is_err());
    Ok(())
}

#[tokio::test]
async fn confirmed_send_times_out_without_peer_client() -> Result<()> {
    init_tracing();
    let config = PeerLinkConfig {
        channel: ChannelConfig {
            receipt_timeout: Duration::from_millis(50),
            ..ChannelConfig::default()
        },
        ..PeerLinkConfig::default()
    };
    let (dapp, _inbound) = LinkManager::new(config);
    let link = test_link(0x03, "silent");
    let password = link.connection_password;
    dapp.add_link(link).await;

    let (a, _silent) = MemoryChannel::pair();
    dapp.attach(&password, Arc::new(a)).await?;

    let err = dapp
        .send_message_confirmed(&password, &b"anyone?"[..])
        .await
        .unwrap_err();
    assert!(matches!(err, PeerLinkError::Channel(ChannelError::Timeout(_))));
    Ok(())
}

#[tokio::test]
async fn shutdown_detaches_everything() -> Result<()> {
    init_tracing();
    let (wallet, _dapp, _inbound) = paired().await?;
    let password = test_link(0xde, "Chrome").connection_password;
    assert!(wallet.is_connected(&password).await);

    wallet.shutdown().await;
    assert!(!wallet.is_connected(&password).await);
    assert!(wallet.links().await.contains(&password));

    let err = wallet.send_message(&password, &b"x"[..]).await.unwrap_err();
    assert!(matches!(err, PeerLinkError::NotConnected(_)));
    Ok(())
}

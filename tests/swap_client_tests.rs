//! `SwapClient` delegates to the connected wallet account

use algo_swap_sdk::{
    Address, InMemoryOfferStore, Network, OfferStatus, OperationKind, SwapClient, SwapConfig,
    SwapError, constants::DONATION_ADDRESS, transaction::TransactionKind,
};
use std::sync::Arc;
use std::time::Duration;

mod test_helpers;
use test_helpers::*;

fn client(wallet: MockWallet) -> (SwapClient, Arc<MockNetwork>) {
    let network = Arc::new(MockNetwork::new());
    let config = SwapConfig::new(Network::TestNet, APP_ID).with_progress_reset_delay(Duration::ZERO);
    let client = SwapClient::with_network(
        config,
        network.clone(),
        Arc::new(wallet),
        Arc::new(InMemoryOfferStore::new()),
    );
    (client, network)
}

#[tokio::test]
async fn test_operations_require_connected_wallet() {
    let (client, network) = client(MockWallet::new(vec![creator()]));

    let err = client.create_offer(sample_draft()).await.unwrap_err();
    assert_eq!(err, SwapError::WalletNotConnected);
    assert_eq!(client.opt_in(111).await.unwrap_err(), SwapError::WalletNotConnected);
    assert_eq!(network.submission_count(), 0);
}

#[tokio::test]
async fn test_create_then_cancel_through_client() {
    let (client, _network) = client(MockWallet::new(vec![creator()]));
    client.connect().await.unwrap();

    let created = client.create_offer(sample_draft()).await.unwrap();
    let id = created.offer.unwrap().id;
    assert_eq!(client.offers().await.unwrap().len(), 1);
    // zero reset delay: idle right after success
    assert!(client.progress().current().is_idle());

    let cancelled = client.cancel_offer(&id).await.unwrap();
    assert_eq!(cancelled.offer.unwrap().status, OfferStatus::Cancelled);
}

#[tokio::test]
async fn test_donation_transaction() {
    let (client, _network) = client(MockWallet::new(vec![taker()]));
    client.connect().await.unwrap();

    let txn = client.donation_transaction(1.5).await.unwrap();
    assert_eq!(txn.sender, taker());
    assert_eq!(
        txn.kind,
        TransactionKind::Payment { receiver: client.config.donation_address, amount: 1_500_000 }
    );
    assert_ne!(client.config.donation_address, Address::zero());

    assert!(matches!(client.donation_transaction(0.0).await, Err(SwapError::InvalidAsset(_))));
}

#[tokio::test]
async fn test_donate_pays_donation_address() {
    let wallet = Arc::new(MockWallet::new(vec![taker()]));
    let network = Arc::new(MockNetwork::new());
    let config = SwapConfig::new(Network::TestNet, APP_ID).with_progress_reset_delay(Duration::ZERO);
    let client =
        SwapClient::with_network(config, network.clone(), wallet.clone(), Arc::new(InMemoryOfferStore::new()));
    client.connect().await.unwrap();

    assert!(matches!(client.donate(0.0).await, Err(SwapError::InvalidAsset(_))));
    assert_eq!(wallet.request_count(), 0);

    let outcome = client.donate(0.25).await.unwrap();
    assert_eq!(outcome.kind, OperationKind::Donation);
    assert_eq!(network.submission_count(), 1);
    let signed = wallet.last_request();
    assert_eq!(signed[0].txn.sender, taker());
    assert_eq!(signed[0].txn.kind, TransactionKind::Payment { receiver: DONATION_ADDRESS, amount: 250_000 });
    assert!(client.progress().current().is_idle());
}

//! Test doubles shared by the integration tests
//!
//! `MockWallet` signs with a zero signature (or refuses), `MockNetwork` plays
//! a scripted algod node.
#![allow(dead_code)]

use algo_swap_sdk::{
    Address, NetworkClient, SwapError, SwapResult, WalletSigner,
    network::{ApplicationInfo, ApplicationParams, NodeStatus, PendingTransactionInfo},
    swap::{AssetLeg, OfferDraft, SwapOffer},
    transaction::{SuggestedParams, encode_signed_transaction},
    wallet::SignerTransaction,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Notify;

pub const APP_ID: u64 = 4242;
pub const START_ROUND: u64 = 1_000;

pub fn creator() -> Address {
    Address::new([1u8; 32])
}

pub fn taker() -> Address {
    Address::new([2u8; 32])
}

pub fn test_params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        min_fee: 1_000,
        flat_fee: false,
        first_valid: START_ROUND,
        last_valid: START_ROUND + 1_000,
        genesis_id: "testnet-v1.0".into(),
        genesis_hash: [7u8; 32],
    }
}

/// 100 of asset 111 offered for 50 of asset 222
pub fn sample_draft() -> OfferDraft {
    OfferDraft::new(AssetLeg::new(111, 100, "Alpha", "ALP"), AssetLeg::new(222, 50, "Beta", "BET"))
}

pub fn sample_offer(id: &str, owner: Address, created_at: DateTime<Utc>) -> SwapOffer {
    SwapOffer::from_draft(id, owner, sample_draft(), created_at).unwrap()
}

pub struct MockWallet {
    pub accounts: Vec<Address>,
    /// Accounts returned by `reconnect_session`; empty means no stored session
    pub session: Vec<Address>,
    pub deny: AtomicBool,
    /// When set, signing waits until the gate is notified
    pub gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<Vec<Vec<SignerTransaction>>>>,
    pub disconnects: AtomicUsize,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            session: Vec::new(),
            deny: AtomicBool::new(false),
            gate: None,
            requests: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
        }
    }

    pub fn with_session(mut self, session: Vec<Address>) -> Self {
        self.session = session;
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn denying(self) -> Self {
        self.deny.store(true, Ordering::SeqCst);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Transactions of the most recent signing request, flattened
    pub fn last_request(&self) -> Vec<SignerTransaction> {
        self.requests.lock().last().map(|groups| groups.concat()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl WalletSigner for MockWallet {
    async fn connect(&self) -> SwapResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn reconnect_session(&self) -> SwapResult<Vec<Address>> {
        Ok(self.session.clone())
    }

    async fn disconnect(&self) -> SwapResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(&self, groups: &[Vec<SignerTransaction>]) -> SwapResult<Vec<Vec<u8>>> {
        self.requests.lock().push(groups.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.deny.load(Ordering::SeqCst) {
            return Err(SwapError::SignatureDenied("Request rejected by user".into()));
        }
        groups
            .iter()
            .flatten()
            .map(|item| encode_signed_transaction(&item.txn, &[0u8; 64]))
            .collect()
    }
}

pub struct MockNetwork {
    pub params: SuggestedParams,
    /// Error returned by `send_raw_transaction`, if any
    pub send_error: Mutex<Option<SwapError>>,
    /// Pending lookups before the transaction shows as confirmed; `None` never confirms
    pub confirm_after: Option<u64>,
    pub pool_error: String,
    /// Creator of the swap application; `None` makes the lookup fail
    pub app_creator: Option<Address>,
    pub submissions: Mutex<Vec<Vec<u8>>>,
    pub last_round: AtomicU64,
    pub polls: AtomicU64,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            params: test_params(),
            send_error: Mutex::new(None),
            confirm_after: Some(1),
            pool_error: String::new(),
            app_creator: Some(creator()),
            submissions: Mutex::new(Vec::new()),
            last_round: AtomicU64::new(START_ROUND),
            polls: AtomicU64::new(0),
        }
    }

    pub fn never_confirming(mut self) -> Self {
        self.confirm_after = None;
        self
    }

    pub fn failing_submission(self, error: SwapError) -> Self {
        *self.send_error.lock() = Some(error);
        self
    }

    pub fn with_pool_error(mut self, message: &str) -> Self {
        self.pool_error = message.into();
        self
    }

    pub fn with_app_creator(mut self, creator: Option<Address>) -> Self {
        self.app_creator = creator;
        self
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NetworkClient for MockNetwork {
    async fn transaction_params(&self) -> SwapResult<SuggestedParams> {
        Ok(self.params.clone())
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> SwapResult<String> {
        if let Some(error) = self.send_error.lock().clone() {
            return Err(error);
        }
        let mut submissions = self.submissions.lock();
        submissions.push(signed.to_vec());
        Ok(format!("TX{}", submissions.len()))
    }

    async fn pending_transaction_info(&self, _tx_id: &str) -> SwapResult<PendingTransactionInfo> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let confirmed = self.confirm_after.is_some_and(|after| polls >= after);
        Ok(PendingTransactionInfo {
            confirmed_round: confirmed.then(|| self.last_round.load(Ordering::SeqCst)),
            pool_error: self.pool_error.clone(),
        })
    }

    async fn status(&self) -> SwapResult<NodeStatus> {
        Ok(NodeStatus { last_round: self.last_round.load(Ordering::SeqCst) })
    }

    async fn status_after_block(&self, round: u64) -> SwapResult<NodeStatus> {
        self.last_round.store(round + 1, Ordering::SeqCst);
        Ok(NodeStatus { last_round: round + 1 })
    }

    async fn application_by_id(&self, app_id: u64) -> SwapResult<ApplicationInfo> {
        match self.app_creator {
            Some(creator) => Ok(ApplicationInfo { id: app_id, params: ApplicationParams { creator } }),
            None => Err(SwapError::Network(format!("application {app_id} does not exist"))),
        }
    }
}

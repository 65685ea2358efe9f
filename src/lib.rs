pub mod common;
pub mod constants;
pub mod network;
pub mod swap;
pub mod transaction;
pub mod wallet;

pub use crate::common::{
    Address, CallbackExecutionMode, Network, NetworkConfig, SwapConfig, SwapError, SwapResult,
};
pub use crate::network::{AlgodClient, NetworkClient};
pub use crate::swap::{
    AssetLeg, CallbackContext, CallbackRef, InMemoryOfferStore, NoopCallback, OfferDraft,
    OfferStatus, OfferStore, OperationKind, OperationOutcome, ProgressState, ProgressTracker,
    SwapOffer, SwapOrchestrator, TransactionLifecycleCallback,
};
pub use crate::wallet::{WalletSession, WalletSigner};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::transaction::{Transaction, algos_to_micro, build_payment};

/// Main client for the donation and swap flows
///
/// `SwapClient` wires a connected wallet, an algod node and the offer store
/// together. Every user operation needs a connected wallet; the connected
/// account is the sender of everything it builds.
pub struct SwapClient {
    pub config: SwapConfig,
    /// Node used for parameters, submission and confirmation
    pub network: Arc<dyn NetworkClient>,
    pub wallet: WalletSession,
    orchestrator: SwapOrchestrator,
}

impl SwapClient {
    /// Create a client talking to the algod node named in `config`
    pub fn new(
        config: SwapConfig,
        signer: Arc<dyn WalletSigner>,
        store: Arc<dyn OfferStore>,
    ) -> SwapResult<Self> {
        let network: Arc<dyn NetworkClient> = Arc::new(AlgodClient::from_config(&config.network)?);
        Ok(Self::with_network(config, network, signer, store))
    }

    /// Create a client on top of an existing [`NetworkClient`]
    pub fn with_network(
        config: SwapConfig,
        network: Arc<dyn NetworkClient>,
        signer: Arc<dyn WalletSigner>,
        store: Arc<dyn OfferStore>,
    ) -> Self {
        let orchestrator = SwapOrchestrator::new(network.clone(), signer.clone(), store, config.app_id)
            .with_wait_rounds(config.wait_rounds)
            .with_reset_delay(config.progress_reset_delay);
        info!(network = %config.network.network, app_id = config.app_id, "swap client ready");
        Self { wallet: WalletSession::new(signer), network, orchestrator, config }
    }

    /// Register a hook run after signing and before submission
    pub fn with_callback(mut self, callback: CallbackRef) -> Self {
        self.orchestrator =
            self.orchestrator.with_callback(callback, self.config.callback_execution_mode);
        self
    }

    pub fn orchestrator(&self) -> &SwapOrchestrator {
        &self.orchestrator
    }

    pub fn progress(&self) -> Arc<ProgressTracker> {
        self.orchestrator.progress()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.orchestrator.progress().subscribe()
    }

    pub async fn connect(&self) -> SwapResult<Address> {
        self.wallet.connect().await
    }

    pub async fn reconnect(&self) -> SwapResult<Option<Address>> {
        self.wallet.reconnect().await
    }

    pub async fn disconnect(&self) -> SwapResult<()> {
        self.wallet.disconnect().await
    }

    pub async fn offers(&self) -> SwapResult<Vec<SwapOffer>> {
        self.orchestrator.store().offers().await
    }

    pub async fn opt_in(&self, asset_id: u64) -> SwapResult<OperationOutcome> {
        let address = self.wallet.require_address()?;
        self.orchestrator.opt_in(address, asset_id).await
    }

    pub async fn create_offer(&self, draft: OfferDraft) -> SwapResult<OperationOutcome> {
        let creator = self.wallet.require_address()?;
        self.orchestrator.create_offer(creator, draft).await
    }

    pub async fn accept_offer(&self, offer_id: &str) -> SwapResult<OperationOutcome> {
        let taker = self.wallet.require_address()?;
        self.orchestrator.accept_offer(taker, offer_id).await
    }

    pub async fn cancel_offer(&self, offer_id: &str) -> SwapResult<OperationOutcome> {
        let creator = self.wallet.require_address()?;
        self.orchestrator.cancel_offer(creator, offer_id).await
    }

    /// Donate `amount_algos` from the connected account to the configured
    /// donation address
    pub async fn donate(&self, amount_algos: f64) -> SwapResult<OperationOutcome> {
        let sender = self.wallet.require_address()?;
        let micro_algos = algos_to_micro(amount_algos)?;
        self.orchestrator.donate(sender, self.config.donation_address, micro_algos).await
    }

    /// Unsigned payment of `amount_algos` from the connected account to the
    /// configured donation address
    pub async fn donation_transaction(&self, amount_algos: f64) -> SwapResult<Transaction> {
        let sender = self.wallet.require_address()?;
        let micro_algos = algos_to_micro(amount_algos)?;
        let params = self.network.transaction_params().await?;
        build_payment(sender, self.config.donation_address, micro_algos, &params)
    }
}

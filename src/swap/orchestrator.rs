//! Drives one user operation from building transactions to confirmation
//!
//! Every operation walks the same steps: Preparing(1) → AwaitingSignature(2)
//! → Submitting(3) → Confirming(4). Opt-in and donation fold submission and
//! confirmation into step 3. Offer state is only touched after the chain confirmed.

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::contract::SwapContractClient;
use super::lifecycle::{CallbackContext, CallbackRef};
use super::offer::{OfferDraft, OfferStatus, SwapOffer};
use super::progress::{OperationKind, ProgressTracker};
use super::store::OfferStore;
use crate::common::{Address, CallbackExecutionMode, SwapError, SwapResult};
use crate::constants::{DEFAULT_WAIT_ROUNDS, PROGRESS_RESET_DELAY_MS};
use crate::network::{ConfirmedTransaction, NetworkClient, wait_for_confirmation};
use crate::transaction::{Transaction, build_opt_in, build_payment, validate_amount, validate_asset_id};
use crate::wallet::{SignerTransaction, WalletSigner};

/// Result of a finished operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    /// `None` when nothing had to be sent, e.g. cancelling a cancelled offer
    pub tx_id: Option<String>,
    pub confirmed_round: Option<u64>,
    pub offer: Option<SwapOffer>,
}

impl OperationOutcome {
    fn confirmed(kind: OperationKind, confirmed: ConfirmedTransaction, offer: Option<SwapOffer>) -> Self {
        Self {
            kind,
            tx_id: Some(confirmed.tx_id),
            confirmed_round: Some(confirmed.confirmed_round),
            offer,
        }
    }

    fn unchanged(kind: OperationKind, offer: SwapOffer) -> Self {
        Self { kind, tx_id: None, confirmed_round: None, offer: Some(offer) }
    }
}

/// Releases the single-flight flag on every exit path. A future dropped
/// after `begin` but before settling also puts the tracker back to idle.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
    tracking: Option<(&'a ProgressTracker, OperationKind)>,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SwapResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SwapError::OperationInProgress)?;
        Ok(Self { flag, tracking: None })
    }

    fn begin(&mut self, progress: &'a ProgressTracker, kind: OperationKind) {
        progress.begin(kind);
        self.tracking = Some((progress, kind));
    }

    fn settle<T>(&mut self, result: &SwapResult<T>, reset_delay: Duration) {
        let Some((progress, kind)) = self.tracking.take() else {
            return;
        };
        match result {
            Ok(_) => progress.complete(reset_delay),
            Err(e) if e.is_local() => {
                debug!(operation = kind.label(), error = %e, "operation rejected before sending");
                progress.fail();
            }
            Err(e) => {
                warn!(operation = kind.label(), error = %e, "operation failed");
                progress.fail();
            }
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some((progress, kind)) = self.tracking.take() {
            warn!(operation = kind.label(), "operation dropped before it settled");
            progress.fail();
        }
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SwapOrchestrator {
    contract: SwapContractClient,
    network: Arc<dyn NetworkClient>,
    signer: Arc<dyn WalletSigner>,
    store: Arc<dyn OfferStore>,
    progress: Arc<ProgressTracker>,
    callback: Option<CallbackRef>,
    callback_mode: CallbackExecutionMode,
    wait_rounds: u64,
    reset_delay: Duration,
    in_flight: AtomicBool,
}

impl SwapOrchestrator {
    pub fn new(
        network: Arc<dyn NetworkClient>,
        signer: Arc<dyn WalletSigner>,
        store: Arc<dyn OfferStore>,
        app_id: u64,
    ) -> Self {
        Self {
            contract: SwapContractClient::new(network.clone(), app_id),
            network,
            signer,
            store,
            progress: Arc::new(ProgressTracker::new()),
            callback: None,
            callback_mode: CallbackExecutionMode::default(),
            wait_rounds: DEFAULT_WAIT_ROUNDS,
            reset_delay: Duration::from_millis(PROGRESS_RESET_DELAY_MS),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_callback(mut self, callback: CallbackRef, mode: CallbackExecutionMode) -> Self {
        self.callback = Some(callback);
        self.callback_mode = mode;
        self
    }

    pub fn with_wait_rounds(mut self, wait_rounds: u64) -> Self {
        self.wait_rounds = wait_rounds;
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn contract(&self) -> &SwapContractClient {
        &self.contract
    }

    pub fn progress(&self) -> Arc<ProgressTracker> {
        self.progress.clone()
    }

    pub fn store(&self) -> Arc<dyn OfferStore> {
        self.store.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Escrow `asset_to_send` and register a new offer
    pub async fn create_offer(&self, creator: Address, draft: OfferDraft) -> SwapResult<OperationOutcome> {
        let mut guard = FlightGuard::acquire(&self.in_flight)?;
        let kind = OperationKind::CreateOffer;
        guard.begin(&self.progress, kind);
        let result = self.run_create(creator, draft).await;
        guard.settle(&result, self.reset_delay);
        result
    }

    async fn run_create(&self, creator: Address, draft: OfferDraft) -> SwapResult<OperationOutcome> {
        self.progress.advance(1, "Preparing swap offer");
        let group = self.contract.create_offer(creator, &draft).await?;
        let confirmed = self.execute(OperationKind::CreateOffer, group.into_transactions()).await?;
        let offer = self.store.record_created(draft, creator, &confirmed.tx_id).await?;
        info!(offer_id = %offer.id, round = confirmed.confirmed_round, "swap offer created");
        Ok(OperationOutcome::confirmed(OperationKind::CreateOffer, confirmed, Some(offer)))
    }

    /// Take an open offer: pay the creator and receive the escrowed asset
    pub async fn accept_offer(&self, taker: Address, offer_id: &str) -> SwapResult<OperationOutcome> {
        let mut guard = FlightGuard::acquire(&self.in_flight)?;
        let kind = OperationKind::AcceptOffer;
        guard.begin(&self.progress, kind);
        let result = self.run_accept(taker, offer_id).await;
        guard.settle(&result, self.reset_delay);
        result
    }

    async fn run_accept(&self, taker: Address, offer_id: &str) -> SwapResult<OperationOutcome> {
        let offer = self.load_offer(offer_id).await?;
        offer.ensure_acceptable(Utc::now())?;
        if offer.creator == taker {
            return Err(SwapError::InvalidOffer("You cannot accept your own offer".into()));
        }

        self.progress.advance(1, "Preparing swap acceptance");
        let group = self.contract.accept_offer(taker, &offer).await?;
        let confirmed = self.execute(OperationKind::AcceptOffer, group.into_transactions()).await?;
        let offer = self.store.mark_completed(&offer.id).await?;
        info!(offer_id = %offer.id, %taker, round = confirmed.confirmed_round, "swap offer accepted");
        Ok(OperationOutcome::confirmed(OperationKind::AcceptOffer, confirmed, Some(offer)))
    }

    /// Withdraw an offer. Cancelling an already-cancelled offer sends nothing.
    pub async fn cancel_offer(&self, creator: Address, offer_id: &str) -> SwapResult<OperationOutcome> {
        let mut guard = FlightGuard::acquire(&self.in_flight)?;
        let kind = OperationKind::CancelOffer;

        let offer = self.load_offer(offer_id).await?;
        match offer.status {
            OfferStatus::Cancelled => {
                debug!(offer_id, "offer already cancelled");
                return Ok(OperationOutcome::unchanged(kind, offer));
            }
            OfferStatus::Completed => {
                return Err(SwapError::InvalidOffer(format!("Offer {offer_id} is already completed")));
            }
            OfferStatus::Open => {}
        }
        if offer.creator != creator {
            return Err(SwapError::InvalidOffer("Only the creator can cancel an offer".into()));
        }

        guard.begin(&self.progress, kind);
        let result = self.run_cancel(creator, offer).await;
        guard.settle(&result, self.reset_delay);
        result
    }

    async fn run_cancel(&self, creator: Address, offer: SwapOffer) -> SwapResult<OperationOutcome> {
        self.progress.advance(1, "Preparing cancellation");
        let txn = self.contract.cancel_offer(creator).await?;
        let confirmed = self.execute(OperationKind::CancelOffer, vec![txn]).await?;
        let offer = self.store.mark_cancelled(&offer.id).await?;
        info!(offer_id = %offer.id, round = confirmed.confirmed_round, "swap offer cancelled");
        Ok(OperationOutcome::confirmed(OperationKind::CancelOffer, confirmed, Some(offer)))
    }

    /// Let `address` hold `asset_id`
    pub async fn opt_in(&self, address: Address, asset_id: u64) -> SwapResult<OperationOutcome> {
        let mut guard = FlightGuard::acquire(&self.in_flight)?;
        let kind = OperationKind::OptIn;
        guard.begin(&self.progress, kind);
        let result = self.run_opt_in(address, asset_id).await;
        guard.settle(&result, self.reset_delay);
        result
    }

    async fn run_opt_in(&self, address: Address, asset_id: u64) -> SwapResult<OperationOutcome> {
        validate_asset_id(asset_id)?;
        self.progress.advance(1, "Preparing opt-in");
        let params = self.network.transaction_params().await?;
        let txn = build_opt_in(address, asset_id, &params)?;
        let confirmed = self.execute(OperationKind::OptIn, vec![txn]).await?;
        info!(%address, asset_id, round = confirmed.confirmed_round, "asset opt-in confirmed");
        Ok(OperationOutcome::confirmed(OperationKind::OptIn, confirmed, None))
    }

    /// Send `micro_algos` from `sender` to `receiver` as a single payment
    pub async fn donate(&self, sender: Address, receiver: Address, micro_algos: u64) -> SwapResult<OperationOutcome> {
        let mut guard = FlightGuard::acquire(&self.in_flight)?;
        let kind = OperationKind::Donation;
        guard.begin(&self.progress, kind);
        let result = self.run_donation(sender, receiver, micro_algos).await;
        guard.settle(&result, self.reset_delay);
        result
    }

    async fn run_donation(&self, sender: Address, receiver: Address, micro_algos: u64) -> SwapResult<OperationOutcome> {
        validate_amount(micro_algos, "Donation")?;
        self.progress.advance(1, "Preparing donation");
        let params = self.network.transaction_params().await?;
        let txn = build_payment(sender, receiver, micro_algos, &params)?;
        let confirmed = self.execute(OperationKind::Donation, vec![txn]).await?;
        info!(%sender, %receiver, micro_algos, round = confirmed.confirmed_round, "donation confirmed");
        Ok(OperationOutcome::confirmed(OperationKind::Donation, confirmed, None))
    }

    async fn load_offer(&self, offer_id: &str) -> SwapResult<SwapOffer> {
        self.store
            .get(offer_id)
            .await?
            .ok_or_else(|| SwapError::InvalidOffer(format!("Offer {offer_id} not found")))
    }

    /// Steps 2 to the end: sign the whole batch at once, submit, confirm
    async fn execute(&self, kind: OperationKind, transactions: Vec<Transaction>) -> SwapResult<ConfirmedTransaction> {
        let first = transactions
            .first()
            .ok_or_else(|| SwapError::Encoding("nothing to sign".into()))?;
        let expected_id = first.id()?;
        let count = transactions.len();

        self.progress.advance(2, "Waiting for signature in your wallet");
        let request = vec![transactions.into_iter().map(SignerTransaction::new).collect::<Vec<_>>()];
        let signed = self.signer.sign_transaction(&request).await.map_err(|e| {
            warn!(operation = kind.label(), error = %e, "signing failed");
            e
        })?;
        if signed.len() != count {
            return Err(SwapError::Wallet(format!(
                "wallet returned {} signed transactions, expected {count}",
                signed.len()
            )));
        }

        self.run_callback(kind, &expected_id, &signed).await?;

        let merged = kind.total_steps() == 3;
        if merged {
            self.progress.advance(3, "Submitting and waiting for confirmation");
        } else {
            self.progress.advance(3, "Submitting transaction");
        }
        let tx_id = self.network.send_raw_transaction(&signed.concat()).await?;
        if tx_id != expected_id {
            warn!(%tx_id, %expected_id, "node reported a different transaction id");
        }
        info!(operation = kind.label(), %tx_id, group_size = count, "transaction submitted");

        if !merged {
            self.progress.advance(4, "Waiting for confirmation");
        }
        wait_for_confirmation(self.network.as_ref(), &tx_id, self.wait_rounds).await
    }

    async fn run_callback(&self, kind: OperationKind, tx_id: &str, signed: &[Vec<u8>]) -> SwapResult<()> {
        let Some(callback) = &self.callback else {
            return Ok(());
        };
        let context = CallbackContext::new(kind, tx_id.to_string(), signed.to_vec());

        match self.callback_mode {
            CallbackExecutionMode::Sync => {
                if let Err(e) = callback.on_transaction_signed(context).await {
                    error!(operation = kind.label(), error = ?e, "on_transaction_signed failed (Sync mode)");
                    return Err(SwapError::Submission(format!("lifecycle callback failed: {e}")));
                }
            }
            CallbackExecutionMode::Async => {
                let callback = callback.clone();
                tokio::spawn(async move {
                    if let Err(e) = callback.on_transaction_signed(context).await {
                        error!(error = ?e, "on_transaction_signed failed (Async mode)");
                    }
                });
            }
        }
        Ok(())
    }
}

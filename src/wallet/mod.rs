//! Wallet signer interface and connection session state
//!
//! The signer itself (a mobile wallet bridge) lives outside this crate; it
//! only has to implement [`WalletSigner`].

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::common::{Address, SwapError, SwapResult};
use crate::transaction::Transaction;

/// One transaction in a signing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerTransaction {
    pub txn: Transaction,
    /// Restrict which accounts should sign; `None` lets the wallet sign with the sender
    pub signers: Option<Vec<Address>>,
}

impl SignerTransaction {
    pub fn new(txn: Transaction) -> Self {
        Self { txn, signers: None }
    }
}

/// External wallet capable of connecting accounts and signing transactions
///
/// `sign_transaction` receives a list of atomic groups and returns one signed
/// blob per transaction, flattened in request order. A user rejection must be
/// reported as [`SwapError::SignatureDenied`].
#[async_trait::async_trait]
pub trait WalletSigner: Send + Sync {
    async fn connect(&self) -> SwapResult<Vec<Address>>;

    /// Restore a previous session; an empty list means there was none
    async fn reconnect_session(&self) -> SwapResult<Vec<Address>>;

    async fn disconnect(&self) -> SwapResult<()>;

    async fn sign_transaction(&self, groups: &[Vec<SignerTransaction>]) -> SwapResult<Vec<Vec<u8>>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub address: Option<Address>,
    pub is_connected: bool,
}

/// Tracks which account is connected through a [`WalletSigner`]
pub struct WalletSession {
    signer: Arc<dyn WalletSigner>,
    state: RwLock<WalletState>,
}

impl WalletSession {
    pub fn new(signer: Arc<dyn WalletSigner>) -> Self {
        Self { signer, state: RwLock::new(WalletState::default()) }
    }

    pub fn signer(&self) -> Arc<dyn WalletSigner> {
        self.signer.clone()
    }

    pub fn state(&self) -> WalletState {
        self.state.read().clone()
    }

    pub fn address(&self) -> Option<Address> {
        self.state.read().address
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected
    }

    pub fn require_address(&self) -> SwapResult<Address> {
        self.address().ok_or(SwapError::WalletNotConnected)
    }

    fn set_connected(&self, address: Address) {
        *self.state.write() = WalletState { address: Some(address), is_connected: true };
    }

    pub async fn connect(&self) -> SwapResult<Address> {
        let accounts = self.signer.connect().await?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| SwapError::Wallet("wallet returned no accounts".into()))?;
        self.set_connected(address);
        info!(%address, "wallet connected");
        Ok(address)
    }

    /// Restore a previous session. With no prior session this returns `None`
    /// and leaves the session disconnected.
    pub async fn reconnect(&self) -> SwapResult<Option<Address>> {
        let accounts = self.signer.reconnect_session().await?;
        match accounts.first().copied() {
            Some(address) => {
                self.set_connected(address);
                info!(%address, "wallet session restored");
                Ok(Some(address))
            }
            None => Ok(None),
        }
    }

    pub async fn disconnect(&self) -> SwapResult<()> {
        if let Err(e) = self.signer.disconnect().await {
            warn!(error = %e, "wallet disconnect failed");
            return Err(e);
        }
        *self.state.write() = WalletState::default();
        info!("wallet disconnected");
        Ok(())
    }
}

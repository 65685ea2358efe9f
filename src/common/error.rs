//! Error taxonomy shared by the builder, contract client and orchestrator

/// Errors surfaced by swap and transaction operations.
///
/// Nothing in this crate retries on error: every variant propagates to the
/// caller of the orchestrator, which is expected to let the user re-initiate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    /// Bad asset identifier or amount, caught before anything reaches the chain
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The offer is not in a state that allows the requested operation
    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    /// Application metadata lookup failed or returned an unexpected shape
    #[error("contract query failed: {0}")]
    ContractQuery(String),

    /// The user rejected the signature request in their wallet
    #[error("signature request denied: {0}")]
    SignatureDenied(String),

    /// The node rejected the transaction or the network failed during submission
    #[error("submission failed: {0}")]
    Submission(String),

    #[error("transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    /// Node query (params, status) failed
    #[error("network error: {0}")]
    Network(String),

    /// Wallet failure other than an explicit user denial
    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("wallet is not connected")]
    WalletNotConnected,

    #[error("another transaction is already in progress")]
    OperationInProgress,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SwapError {
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress { address: address.into(), reason: reason.into() }
    }

    /// Single human-readable message shown to the user when an operation fails
    pub fn user_message(&self) -> String {
        match self {
            SwapError::InvalidAsset(msg) | SwapError::InvalidOffer(msg) => msg.clone(),
            SwapError::InvalidAddress { .. } => "Invalid account address".to_string(),
            SwapError::ContractQuery(_) => {
                "Could not load the swap contract. Please try again later.".to_string()
            }
            SwapError::SignatureDenied(_) => "Transaction was rejected in your wallet".to_string(),
            SwapError::Submission(msg) => format!("Transaction failed: {msg}"),
            SwapError::ConfirmationTimeout { .. } => {
                "Transaction was not confirmed in time. Please check your wallet before retrying."
                    .to_string()
            }
            SwapError::Network(_) => "Network unavailable. Please try again.".to_string(),
            SwapError::Wallet(msg) => msg.clone(),
            SwapError::WalletNotConnected => "Please connect your wallet first".to_string(),
            SwapError::OperationInProgress => {
                "Please wait for the current transaction to finish".to_string()
            }
            SwapError::Encoding(_) | SwapError::Config(_) => self.to_string(),
        }
    }

    /// Whether the failure happened before anything was sent to the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SwapError::InvalidAsset(_)
                | SwapError::InvalidAddress { .. }
                | SwapError::InvalidOffer(_)
                | SwapError::WalletNotConnected
                | SwapError::OperationInProgress
                | SwapError::Encoding(_)
                | SwapError::Config(_)
        )
    }
}

pub type SwapResult<T> = Result<T, SwapError>;

//! Node access: typed algod responses, the client trait and confirmation polling

pub mod algod;

pub use algod::AlgodClient;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::{Address, SwapError, SwapResult};
use crate::constants::DEFAULT_VALIDITY_ROUNDS;
use crate::transaction::SuggestedParams;

/// `/v2/transactions/params` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionParamsResponse {
    #[serde(default)]
    pub consensus_version: String,
    pub fee: u64,
    pub genesis_hash: String,
    pub genesis_id: String,
    pub last_round: u64,
    pub min_fee: u64,
}

impl TransactionParamsResponse {
    /// Apply the default validity window and decode the genesis hash
    pub fn into_suggested_params(self) -> SwapResult<SuggestedParams> {
        let raw = STANDARD
            .decode(self.genesis_hash.as_bytes())
            .map_err(|e| SwapError::Network(format!("invalid genesis hash: {e}")))?;
        let genesis_hash: [u8; 32] = raw
            .try_into()
            .map_err(|_| SwapError::Network("genesis hash must be 32 bytes".into()))?;
        Ok(SuggestedParams {
            fee: self.fee,
            min_fee: self.min_fee,
            flat_fee: false,
            first_valid: self.last_round,
            last_valid: self.last_round + DEFAULT_VALIDITY_ROUNDS,
            genesis_id: self.genesis_id,
            genesis_hash,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionInfo {
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    #[serde(default)]
    pub pool_error: String,
}

impl PendingTransactionInfo {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|round| round > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationParams {
    pub creator: Address,
}

/// `/v2/applications/{id}` response, trimmed to what the swap flow reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
}

/// A transaction that made it into a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub tx_id: String,
    pub confirmed_round: u64,
}

/// Node operations the swap flow depends on
#[async_trait::async_trait]
pub trait NetworkClient: Send + Sync {
    async fn transaction_params(&self) -> SwapResult<SuggestedParams>;

    /// Submit one or more concatenated signed transactions, returns the first id
    async fn send_raw_transaction(&self, signed: &[u8]) -> SwapResult<String>;

    async fn pending_transaction_info(&self, tx_id: &str) -> SwapResult<PendingTransactionInfo>;

    async fn status(&self) -> SwapResult<NodeStatus>;

    /// Block until the node has seen a round after `round`
    async fn status_after_block(&self, round: u64) -> SwapResult<NodeStatus>;

    async fn application_by_id(&self, app_id: u64) -> SwapResult<ApplicationInfo>;
}

/// Wait until `tx_id` is confirmed, for at most `max_rounds` rounds
///
/// A non-empty pool error means the node dropped the transaction and fails
/// immediately as a submission error.
pub async fn wait_for_confirmation(
    client: &dyn NetworkClient,
    tx_id: &str,
    max_rounds: u64,
) -> SwapResult<ConfirmedTransaction> {
    if max_rounds == 0 {
        return Err(SwapError::ConfirmationTimeout { tx_id: tx_id.to_string(), rounds: 0 });
    }

    let start_round = client.status().await?.last_round.saturating_add(1);
    let deadline = start_round.saturating_add(max_rounds);
    let mut current_round = start_round;

    while current_round < deadline {
        match client.pending_transaction_info(tx_id).await {
            Ok(info) => {
                if let Some(confirmed_round) = info.confirmed_round.filter(|r| *r > 0) {
                    debug!(tx_id, confirmed_round, "transaction confirmed");
                    return Ok(ConfirmedTransaction { tx_id: tx_id.to_string(), confirmed_round });
                }
                if !info.pool_error.is_empty() {
                    return Err(SwapError::Submission(format!(
                        "transaction rejected from pool: {}",
                        info.pool_error
                    )));
                }
            }
            // the node may not know the transaction yet, keep polling
            Err(e) => warn!(tx_id, error = %e, "pending transaction lookup failed"),
        }

        client.status_after_block(current_round).await?;
        current_round += 1;
    }

    Err(SwapError::ConfirmationTimeout { tx_id: tx_id.to_string(), rounds: max_rounds })
}

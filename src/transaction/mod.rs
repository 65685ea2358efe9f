pub mod builder;
pub mod encoding;

pub use builder::*;
pub use encoding::{
    assign_group_id, compute_group_id, encode_signed_transaction, encode_transaction,
    encode_uint64, transaction_id,
};

use crate::common::{Address, SwapError, SwapResult};
use crate::constants::MAX_GROUP_SIZE;

/// Network parameters every transaction is built against
///
/// Mirrors the node's `/v2/transactions/params` response with the validity
/// window already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Fee per byte, or the absolute fee when `flat_fee` is set
    pub fee: u64,
    pub min_fee: u64,
    pub flat_fee: bool,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// What an application call does after running the approval program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OnComplete {
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment { receiver: Address, amount: u64 },
    AssetTransfer { asset_id: u64, receiver: Address, amount: u64 },
    ApplicationCall {
        app_id: u64,
        on_complete: OnComplete,
        args: Vec<Vec<u8>>,
        /// Assets the approval program may touch
        foreign_assets: Vec<u64>,
    },
}

/// An unsigned Algorand transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Vec<u8>,
    pub group: Option<[u8; 32]>,
    pub kind: TransactionKind,
}

impl Transaction {
    pub(crate) fn with_params(sender: Address, kind: TransactionKind, params: &SuggestedParams) -> Self {
        Self {
            sender,
            fee: params.fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note: Vec::new(),
            group: None,
            kind,
        }
    }

    /// Wire tag of the transaction type
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            TransactionKind::Payment { .. } => "pay",
            TransactionKind::AssetTransfer { .. } => "axfer",
            TransactionKind::ApplicationCall { .. } => "appl",
        }
    }

    pub fn is_application_call(&self) -> bool {
        matches!(self.kind, TransactionKind::ApplicationCall { .. })
    }

    /// Application arguments, for application calls only
    pub fn app_args(&self) -> Option<&[Vec<u8>]> {
        match &self.kind {
            TransactionKind::ApplicationCall { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Canonical msgpack encoding, the bytes a wallet signs (without the "TX" prefix)
    pub fn encode(&self) -> SwapResult<Vec<u8>> {
        encode_transaction(self)
    }

    /// Base32 transaction id
    pub fn id(&self) -> SwapResult<String> {
        transaction_id(self)
    }
}

/// Transactions bound by a shared group id, accepted or rejected atomically
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    transactions: Vec<Transaction>,
    group_id: [u8; 32],
}

impl TransactionGroup {
    /// Bind fully built transactions into a group, in the given order
    pub fn new(mut transactions: Vec<Transaction>) -> SwapResult<Self> {
        if transactions.len() > MAX_GROUP_SIZE {
            return Err(SwapError::Encoding(format!(
                "group of {} exceeds the limit of {MAX_GROUP_SIZE}",
                transactions.len()
            )));
        }
        let group_id = assign_group_id(&mut transactions)?;
        Ok(Self { transactions, group_id })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    pub fn group_id(&self) -> &[u8; 32] {
        &self.group_id
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Id the node reports for the whole submission: the first member's id
    pub fn leading_id(&self) -> SwapResult<String> {
        self.transactions
            .first()
            .ok_or_else(|| SwapError::Encoding("empty transaction group".into()))?
            .id()
    }
}

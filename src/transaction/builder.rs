//! Unsigned transaction construction
//!
//! Every builder is pure given the network parameters: nothing here talks to
//! a node or a wallet. Local validation failures are reported as
//! [`SwapError::InvalidAsset`] and never reach the chain.

use super::encoding::{encode_transaction, encode_uint64};
use super::{OnComplete, SuggestedParams, Transaction, TransactionGroup, TransactionKind};
use crate::common::{Address, SwapError, SwapResult};
use crate::constants::{MICRO_ALGOS_PER_ALGO, MIN_TXN_FEE, SIGNATURE_OVERHEAD_BYTES, swap_ops};

/// Convert a user-entered Algo amount to microAlgos, truncating toward zero
pub fn algos_to_micro(algos: f64) -> SwapResult<u64> {
    if !algos.is_finite() || algos <= 0.0 {
        return Err(SwapError::InvalidAsset(format!("Amount must be positive, got {algos}")));
    }
    let micro = (algos * MICRO_ALGOS_PER_ALGO as f64).floor();
    if micro < 1.0 {
        return Err(SwapError::InvalidAsset(format!(
            "Amount {algos} is below one microAlgo"
        )));
    }
    if micro >= u64::MAX as f64 {
        return Err(SwapError::InvalidAsset(format!("Amount {algos} is too large")));
    }
    Ok(micro as u64)
}

pub fn validate_asset_id(asset_id: u64) -> SwapResult<()> {
    if asset_id == 0 {
        return Err(SwapError::InvalidAsset("Asset id must be a positive integer".into()));
    }
    Ok(())
}

pub fn validate_amount(amount: u64, what: &str) -> SwapResult<()> {
    if amount == 0 {
        return Err(SwapError::InvalidAsset(format!("{what} amount must be greater than zero")));
    }
    Ok(())
}

/// Validate the two legs of a swap
pub fn validate_swap_legs(
    asset1_id: u64,
    asset1_amount: u64,
    asset2_id: u64,
    asset2_amount: u64,
) -> SwapResult<()> {
    validate_asset_id(asset1_id)?;
    validate_asset_id(asset2_id)?;
    if asset1_id == asset2_id {
        return Err(SwapError::InvalidAsset(format!(
            "Cannot swap asset {asset1_id} for itself"
        )));
    }
    validate_amount(asset1_amount, "Send")?;
    validate_amount(asset2_amount, "Receive")?;
    Ok(())
}

fn validate_app_id(app_id: u64) -> SwapResult<()> {
    if app_id == 0 {
        return Err(SwapError::ContractQuery("swap application id is not set".into()));
    }
    Ok(())
}

/// Apply the fee policy: flat fee as given, otherwise per-byte over the
/// signed size, floored at the node's minimum fee and never below the
/// protocol minimum
fn finalize(mut txn: Transaction, params: &SuggestedParams) -> SwapResult<Transaction> {
    if params.flat_fee {
        txn.fee = params.fee;
        return Ok(txn);
    }
    txn.fee = params.fee;
    let estimated_size = encode_transaction(&txn)?.len() as u64 + SIGNATURE_OVERHEAD_BYTES;
    let floor = params.min_fee.max(MIN_TXN_FEE);
    txn.fee = params.fee.saturating_mul(estimated_size).max(floor);
    Ok(txn)
}

pub fn build_payment(
    from: Address,
    to: Address,
    micro_algos: u64,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    validate_amount(micro_algos, "Payment")?;
    let kind = TransactionKind::Payment { receiver: to, amount: micro_algos };
    finalize(Transaction::with_params(from, kind, params), params)
}

pub fn build_asset_transfer(
    from: Address,
    to: Address,
    asset_id: u64,
    amount: u64,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    validate_asset_id(asset_id)?;
    let kind = TransactionKind::AssetTransfer { asset_id, receiver: to, amount };
    finalize(Transaction::with_params(from, kind, params), params)
}

/// Zero-amount self transfer that lets `address` hold `asset_id`
pub fn build_opt_in(address: Address, asset_id: u64, params: &SuggestedParams) -> SwapResult<Transaction> {
    build_asset_transfer(address, address, asset_id, 0, params)
}

pub fn build_application_call(
    sender: Address,
    app_id: u64,
    on_complete: OnComplete,
    args: Vec<Vec<u8>>,
    foreign_assets: Vec<u64>,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    validate_app_id(app_id)?;
    for asset_id in &foreign_assets {
        validate_asset_id(*asset_id)?;
    }
    let kind = TransactionKind::ApplicationCall { app_id, on_complete, args, foreign_assets };
    finalize(Transaction::with_params(sender, kind, params), params)
}

/// `create` call; numeric arguments go in as fixed-width big-endian integers.
/// The offered asset is referenced so the contract can hold it.
pub fn build_swap_create_call(
    creator: Address,
    app_id: u64,
    asset1_id: u64,
    asset1_amount: u64,
    asset2_id: u64,
    asset2_amount: u64,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    validate_swap_legs(asset1_id, asset1_amount, asset2_id, asset2_amount)?;
    let args = vec![
        swap_ops::CREATE.as_bytes().to_vec(),
        encode_uint64(asset1_id),
        encode_uint64(asset1_amount),
        encode_uint64(asset2_id),
        encode_uint64(asset2_amount),
    ];
    build_application_call(creator, app_id, OnComplete::NoOp, args, vec![asset1_id], params)
}

/// Transfer of the offered asset into the application's escrow account
pub fn build_escrow_transfer(
    creator: Address,
    app_id: u64,
    asset_id: u64,
    amount: u64,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    validate_app_id(app_id)?;
    validate_amount(amount, "Escrow")?;
    build_asset_transfer(creator, Address::for_application(app_id), asset_id, amount, params)
}

/// `[create call, escrow transfer]`, grouped
pub fn build_swap_create_group(
    creator: Address,
    app_id: u64,
    asset1_id: u64,
    asset1_amount: u64,
    asset2_id: u64,
    asset2_amount: u64,
    params: &SuggestedParams,
) -> SwapResult<TransactionGroup> {
    let create = build_swap_create_call(
        creator,
        app_id,
        asset1_id,
        asset1_amount,
        asset2_id,
        asset2_amount,
        params,
    )?;
    let escrow = build_escrow_transfer(creator, app_id, asset1_id, asset1_amount, params)?;
    TransactionGroup::new(vec![create, escrow])
}

/// `[accept call from taker, transfer of asset2 from taker to creator]`, grouped
///
/// The contract expects the application call first; the order must not change.
pub fn build_swap_accept_group(
    taker: Address,
    creator: Address,
    app_id: u64,
    asset1_id: u64,
    asset1_amount: u64,
    asset2_id: u64,
    asset2_amount: u64,
    params: &SuggestedParams,
) -> SwapResult<TransactionGroup> {
    validate_swap_legs(asset1_id, asset1_amount, asset2_id, asset2_amount)?;
    let accept = build_application_call(
        taker,
        app_id,
        OnComplete::NoOp,
        vec![swap_ops::ACCEPT.as_bytes().to_vec()],
        vec![asset1_id],
        params,
    )?;
    let payment = build_asset_transfer(taker, creator, asset2_id, asset2_amount, params)?;
    TransactionGroup::new(vec![accept, payment])
}

/// `cancel` call that deletes the on-chain offer record
pub fn build_swap_cancel_call(
    creator: Address,
    app_id: u64,
    params: &SuggestedParams,
) -> SwapResult<Transaction> {
    build_application_call(
        creator,
        app_id,
        OnComplete::DeleteApplication,
        vec![swap_ops::CANCEL.as_bytes().to_vec()],
        Vec::new(),
        params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SuggestedParams {
        SuggestedParams {
            fee: 0,
            min_fee: 1_000,
            flat_fee: false,
            first_valid: 10,
            last_valid: 1_010,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: [5u8; 32],
        }
    }

    #[test]
    fn test_algos_to_micro_floors() {
        assert_eq!(algos_to_micro(1.0).unwrap(), 1_000_000);
        assert_eq!(algos_to_micro(0.5).unwrap(), 500_000);
        assert_eq!(algos_to_micro(2.5000009).unwrap(), 2_500_000);
    }

    #[test]
    fn test_algos_to_micro_rejects_non_positive() {
        assert!(matches!(algos_to_micro(0.0), Err(SwapError::InvalidAsset(_))));
        assert!(matches!(algos_to_micro(-1.0), Err(SwapError::InvalidAsset(_))));
        assert!(matches!(algos_to_micro(f64::NAN), Err(SwapError::InvalidAsset(_))));
        assert!(matches!(algos_to_micro(0.0000001), Err(SwapError::InvalidAsset(_))));
    }

    #[test]
    fn test_min_fee_applies_when_per_byte_fee_is_zero() {
        let txn = build_payment(Address::new([1; 32]), Address::new([2; 32]), 10, &params()).unwrap();
        assert_eq!(txn.fee, 1_000);
    }

    #[test]
    fn test_fee_never_below_protocol_minimum() {
        let mut p = params();
        p.min_fee = 0;
        let txn = build_payment(Address::new([1; 32]), Address::new([2; 32]), 10, &p).unwrap();
        assert_eq!(txn.fee, MIN_TXN_FEE);
    }

    #[test]
    fn test_per_byte_fee() {
        let mut p = params();
        p.fee = 10;
        let txn = build_payment(Address::new([1; 32]), Address::new([2; 32]), 10, &p).unwrap();
        assert!(txn.fee > 1_000);
        assert_eq!(txn.fee % 10, 0);
    }

    #[test]
    fn test_flat_fee() {
        let mut p = params();
        p.fee = 2_000;
        p.flat_fee = true;
        let txn = build_opt_in(Address::new([1; 32]), 7, &p).unwrap();
        assert_eq!(txn.fee, 2_000);
    }

    #[test]
    fn test_opt_in_is_zero_self_transfer() {
        let addr = Address::new([1; 32]);
        let txn = build_opt_in(addr, 31566704, &params()).unwrap();
        assert_eq!(txn.sender, addr);
        assert_eq!(
            txn.kind,
            TransactionKind::AssetTransfer { asset_id: 31566704, receiver: addr, amount: 0 }
        );
        assert!(matches!(build_opt_in(addr, 0, &params()), Err(SwapError::InvalidAsset(_))));
    }

    #[test]
    fn test_cancel_deletes_application() {
        let txn = build_swap_cancel_call(Address::new([1; 32]), 55, &params()).unwrap();
        match txn.kind {
            TransactionKind::ApplicationCall { app_id, on_complete, args, .. } => {
                assert_eq!(app_id, 55);
                assert_eq!(on_complete, OnComplete::DeleteApplication);
                assert_eq!(args, vec![b"cancel".to_vec()]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_swap_legs_validation() {
        assert!(validate_swap_legs(111, 100, 222, 50).is_ok());
        assert!(validate_swap_legs(111, 100, 111, 50).is_err());
        assert!(validate_swap_legs(111, 0, 222, 50).is_err());
        assert!(validate_swap_legs(111, 100, 222, 0).is_err());
        assert!(validate_swap_legs(0, 100, 222, 50).is_err());
    }

    #[test]
    fn test_unknown_app_id() {
        let err = build_swap_cancel_call(Address::new([1; 32]), 0, &params()).unwrap_err();
        assert!(matches!(err, SwapError::ContractQuery(_)));
    }
}

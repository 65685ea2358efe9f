//! Application-call shapes of the atomic swap contract
//!
//! Turns swap operations into unsigned transactions. Resolves whatever chain
//! metadata the builders need, but never signs or submits.

use std::sync::Arc;
use tracing::{debug, warn};

use super::offer::{OfferDraft, SwapOffer};
use crate::common::{Address, SwapError, SwapResult};
use crate::network::NetworkClient;
use crate::transaction::{
    SuggestedParams, Transaction, TransactionGroup, build_swap_accept_group,
    build_swap_cancel_call, build_swap_create_group, validate_swap_legs,
};

#[derive(Clone)]
pub struct SwapContractClient {
    network: Arc<dyn NetworkClient>,
    app_id: u64,
}

impl SwapContractClient {
    pub fn new(network: Arc<dyn NetworkClient>, app_id: u64) -> Self {
        Self { network, app_id }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Account holding escrowed assets
    pub fn escrow_address(&self) -> Address {
        Address::for_application(self.app_id)
    }

    fn ensure_known_app(&self) -> SwapResult<()> {
        if self.app_id == 0 {
            return Err(SwapError::ContractQuery("swap application id is unknown".into()));
        }
        Ok(())
    }

    async fn params(&self) -> SwapResult<SuggestedParams> {
        self.network.transaction_params().await
    }

    /// Creator recorded by the chain for the swap application
    pub async fn creator_address(&self) -> SwapResult<Address> {
        self.ensure_known_app()?;
        let info = self.network.application_by_id(self.app_id).await.map_err(|e| match e {
            SwapError::ContractQuery(_) => e,
            other => SwapError::ContractQuery(format!(
                "application {} lookup failed: {other}",
                self.app_id
            )),
        })?;
        if info.id != self.app_id {
            return Err(SwapError::ContractQuery(format!(
                "node returned application {} for {}",
                info.id, self.app_id
            )));
        }
        if info.params.creator.is_zero() {
            return Err(SwapError::ContractQuery(format!(
                "application {} has no creator",
                self.app_id
            )));
        }
        Ok(info.params.creator)
    }

    /// `[create call, escrow transfer]` for a new offer
    pub async fn create_offer(&self, creator: Address, draft: &OfferDraft) -> SwapResult<TransactionGroup> {
        draft.validate()?;
        self.ensure_known_app()?;
        let params = self.params().await?;
        let group = build_swap_create_group(
            creator,
            self.app_id,
            draft.asset_to_send.id,
            draft.asset_to_send.amount,
            draft.asset_to_receive.id,
            draft.asset_to_receive.amount,
            &params,
        )?;
        debug!(app_id = self.app_id, %creator, "built create group");
        Ok(group)
    }

    /// `[accept call, payment to creator]` taking `offer`
    pub async fn accept_offer(&self, taker: Address, offer: &SwapOffer) -> SwapResult<TransactionGroup> {
        validate_swap_legs(
            offer.asset_to_send.id,
            offer.asset_to_send.amount,
            offer.asset_to_receive.id,
            offer.asset_to_receive.amount,
        )?;
        let creator = self.creator_address().await?;
        if creator == taker {
            return Err(SwapError::InvalidOffer("You cannot accept your own offer".into()));
        }
        if creator != offer.creator {
            warn!(%creator, offer_creator = %offer.creator, "offer creator differs from contract creator");
        }

        let params = self.params().await?;
        let group = build_swap_accept_group(
            taker,
            creator,
            self.app_id,
            offer.asset_to_send.id,
            offer.asset_to_send.amount,
            offer.asset_to_receive.id,
            offer.asset_to_receive.amount,
            &params,
        )?;
        debug!(app_id = self.app_id, %taker, %creator, "built accept group");
        Ok(group)
    }

    pub async fn cancel_offer(&self, creator: Address) -> SwapResult<Transaction> {
        self.ensure_known_app()?;
        let params = self.params().await?;
        build_swap_cancel_call(creator, self.app_id, &params)
    }
}

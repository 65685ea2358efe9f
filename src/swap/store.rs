//! Offer storage contract
//!
//! Listing and persisting offers is an external service; the orchestrator
//! only reports confirmed results through [`OfferStore`].

use chrono::Utc;
use parking_lot::RwLock;
use tracing::info;

use super::offer::{OfferDraft, SwapOffer};
use crate::common::{Address, SwapError, SwapResult};

#[async_trait::async_trait]
pub trait OfferStore: Send + Sync {
    async fn offers(&self) -> SwapResult<Vec<SwapOffer>>;

    async fn get(&self, id: &str) -> SwapResult<Option<SwapOffer>>;

    /// Record an offer whose create group has been confirmed; the store assigns the id
    async fn record_created(
        &self,
        draft: OfferDraft,
        creator: Address,
        tx_id: &str,
    ) -> SwapResult<SwapOffer>;

    /// Only called after a confirmed accept group
    async fn mark_completed(&self, id: &str) -> SwapResult<SwapOffer>;

    async fn mark_cancelled(&self, id: &str) -> SwapResult<SwapOffer>;
}

/// Process-lifetime store keyed by the confirmed create transaction id
#[derive(Default)]
pub struct InMemoryOfferStore {
    offers: RwLock<Vec<SwapOffer>>,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with offers created elsewhere. An open offer may be
    /// replaced; a completed or cancelled one is final.
    pub fn insert(&self, offer: SwapOffer) -> SwapResult<()> {
        let mut offers = self.offers.write();
        match offers.iter().position(|existing| existing.id == offer.id) {
            Some(index) if !offers[index].is_open() => Err(SwapError::InvalidOffer(format!(
                "Offer {} is already {:?}",
                offer.id, offers[index].status
            ))),
            Some(index) => {
                offers[index] = offer;
                Ok(())
            }
            None => {
                offers.push(offer);
                Ok(())
            }
        }
    }

    pub fn open_offers(&self) -> Vec<SwapOffer> {
        let now = Utc::now();
        self.offers
            .read()
            .iter()
            .filter(|offer| offer.is_open() && !offer.is_expired(now))
            .cloned()
            .collect()
    }

    fn update<F>(&self, id: &str, transition: F) -> SwapResult<SwapOffer>
    where
        F: FnOnce(&mut SwapOffer) -> SwapResult<()>,
    {
        let mut offers = self.offers.write();
        let offer = offers
            .iter_mut()
            .find(|offer| offer.id == id)
            .ok_or_else(|| SwapError::InvalidOffer(format!("Offer {id} not found")))?;
        transition(offer)?;
        Ok(offer.clone())
    }
}

#[async_trait::async_trait]
impl OfferStore for InMemoryOfferStore {
    async fn offers(&self) -> SwapResult<Vec<SwapOffer>> {
        Ok(self.offers.read().clone())
    }

    async fn get(&self, id: &str) -> SwapResult<Option<SwapOffer>> {
        Ok(self.offers.read().iter().find(|offer| offer.id == id).cloned())
    }

    async fn record_created(
        &self,
        draft: OfferDraft,
        creator: Address,
        tx_id: &str,
    ) -> SwapResult<SwapOffer> {
        let offer = SwapOffer::from_draft(tx_id, creator, draft, Utc::now())?;
        self.insert(offer.clone())?;
        info!(offer_id = %offer.id, %creator, "offer recorded");
        Ok(offer)
    }

    async fn mark_completed(&self, id: &str) -> SwapResult<SwapOffer> {
        self.update(id, SwapOffer::complete)
    }

    async fn mark_cancelled(&self, id: &str) -> SwapResult<SwapOffer> {
        self.update(id, SwapOffer::cancel)
    }
}

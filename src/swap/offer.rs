use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Address, SwapError, SwapResult};
use crate::constants::{DEFAULT_OFFER_EXPIRY_HOURS, MAX_OFFER_EXPIRY_HOURS, MIN_OFFER_EXPIRY_HOURS};
use crate::transaction::validate_swap_legs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Open,
    Completed,
    Cancelled,
}

/// One side of a swap, amounts in the asset's smallest unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLeg {
    pub id: u64,
    pub amount: u64,
    pub name: String,
    pub unit_name: String,
}

impl AssetLeg {
    pub fn new(id: u64, amount: u64, name: impl Into<String>, unit_name: impl Into<String>) -> Self {
        Self { id, amount, name: name.into(), unit_name: unit_name.into() }
    }
}

/// What the create form submits, before the offer exists on chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraft {
    pub asset_to_send: AssetLeg,
    pub asset_to_receive: AssetLeg,
    pub expiry_hours: u32,
}

impl OfferDraft {
    pub fn new(asset_to_send: AssetLeg, asset_to_receive: AssetLeg) -> Self {
        Self { asset_to_send, asset_to_receive, expiry_hours: DEFAULT_OFFER_EXPIRY_HOURS }
    }

    pub fn with_expiry_hours(mut self, hours: u32) -> Self {
        self.expiry_hours = hours;
        self
    }

    pub fn validate(&self) -> SwapResult<()> {
        validate_swap_legs(
            self.asset_to_send.id,
            self.asset_to_send.amount,
            self.asset_to_receive.id,
            self.asset_to_receive.amount,
        )?;
        if !(MIN_OFFER_EXPIRY_HOURS..=MAX_OFFER_EXPIRY_HOURS).contains(&self.expiry_hours) {
            return Err(SwapError::InvalidOffer(format!(
                "Expiry must be between {MIN_OFFER_EXPIRY_HOURS} and {MAX_OFFER_EXPIRY_HOURS} hours"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOffer {
    pub id: String,
    pub creator: Address,
    pub asset_to_send: AssetLeg,
    pub asset_to_receive: AssetLeg,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SwapOffer {
    pub fn from_draft(
        id: impl Into<String>,
        creator: Address,
        draft: OfferDraft,
        created_at: DateTime<Utc>,
    ) -> SwapResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: id.into(),
            creator,
            asset_to_send: draft.asset_to_send,
            asset_to_receive: draft.asset_to_receive,
            status: OfferStatus::Open,
            created_at,
            expires_at: created_at + Duration::hours(i64::from(draft.expiry_hours)),
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == OfferStatus::Open
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a counterparty can still accept this offer
    pub fn ensure_acceptable(&self, now: DateTime<Utc>) -> SwapResult<()> {
        if !self.is_open() {
            return Err(SwapError::InvalidOffer(format!("Offer {} is no longer open", self.id)));
        }
        if self.is_expired(now) {
            return Err(SwapError::InvalidOffer(format!("Offer {} has expired", self.id)));
        }
        Ok(())
    }

    /// Remaining time as shown in offer lists: "5h 12m", "42m" or "expired"
    pub fn time_left(&self, now: DateTime<Utc>) -> String {
        let remaining = self.expires_at - now;
        if remaining <= Duration::zero() {
            return "expired".to_string();
        }
        let hours = remaining.num_hours();
        let minutes = remaining.num_minutes() % 60;
        if hours > 0 { format!("{hours}h {minutes}m") } else { format!("{minutes}m") }
    }

    /// Open → Completed. Only called once the accept group is confirmed.
    pub fn complete(&mut self) -> SwapResult<()> {
        match self.status {
            OfferStatus::Open => {
                self.status = OfferStatus::Completed;
                Ok(())
            }
            other => Err(SwapError::InvalidOffer(format!(
                "Offer {} cannot be completed from {other:?}",
                self.id
            ))),
        }
    }

    /// Open → Cancelled. Cancelling an already-cancelled offer is a no-op.
    pub fn cancel(&mut self) -> SwapResult<()> {
        match self.status {
            OfferStatus::Open => {
                self.status = OfferStatus::Cancelled;
                Ok(())
            }
            OfferStatus::Cancelled => Ok(()),
            OfferStatus::Completed => Err(SwapError::InvalidOffer(format!(
                "Offer {} is already completed",
                self.id
            ))),
        }
    }
}

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::offer::{Offer, Resolution};

/// An offer awaiting the worker's decision.
///
/// The resolution moves out of `Unresolved` exactly once. Accept, reject and
/// timer expiry all race through the same compare-and-swap; the losers get
/// `OfferExpired` if expiry won, `AlreadyResolved` otherwise.
#[derive(Debug)]
pub struct PendingOffer {
    offer: Offer,
    deadline: Instant,
    expires_at: DateTime<Utc>,
    state: AtomicU8,
}

impl PendingOffer {
    /// Fails with `BadRequest` when the TTL puts the deadline beyond what the
    /// clock can represent.
    pub fn new(offer: Offer) -> Result<Self, AppError> {
        let ttl = Duration::from_secs(offer.ttl_secs);
        let out_of_range = || {
            AppError::BadRequest(format!(
                "offer {} ttl of {}s is out of range",
                offer.id, offer.ttl_secs
            ))
        };

        let deadline = Instant::now().checked_add(ttl).ok_or_else(out_of_range)?;
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(out_of_range)?;

        Ok(Self {
            offer,
            deadline,
            expires_at,
            state: AtomicU8::new(Resolution::Unresolved as u8),
        })
    }

    pub fn id(&self) -> Uuid {
        self.offer.id
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whole seconds left, rounded up so a live offer never reports zero.
    pub fn seconds_remaining(&self) -> u64 {
        let left = self.deadline.saturating_duration_since(Instant::now());
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    pub fn accept(&self) -> Result<Offer, AppError> {
        self.expire_if_past_deadline()?;
        self.resolve(Resolution::Accepted)?;
        Ok(self.offer.clone())
    }

    pub fn reject(&self) -> Result<(), AppError> {
        self.expire_if_past_deadline()?;
        self.resolve(Resolution::Rejected)
    }

    pub fn expire(&self) -> Result<(), AppError> {
        self.resolve(Resolution::Expired)
    }

    /// The deadline is authoritative even if the expiry timer has not run yet.
    fn expire_if_past_deadline(&self) -> Result<(), AppError> {
        if Instant::now() < self.deadline {
            return Ok(());
        }

        self.resolve(Resolution::Expired)?;
        Err(AppError::OfferExpired(self.offer.id.to_string()))
    }

    fn resolve(&self, outcome: Resolution) -> Result<(), AppError> {
        match self.state.compare_exchange(
            Resolution::Unresolved as u8,
            outcome as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(current) => Err(self.lost_race(Resolution::from_u8(current))),
        }
    }

    fn lost_race(&self, winner: Resolution) -> AppError {
        match winner {
            Resolution::Expired => AppError::OfferExpired(self.offer.id.to_string()),
            _ => AppError::AlreadyResolved(self.offer.id.to_string()),
        }
    }
}

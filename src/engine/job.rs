use chrono::Utc;

use crate::error::AppError;
use crate::geo;
use crate::models::earnings::EarningsRecord;
use crate::models::job::{ActiveJob, JobPhase, PhaseChange};
use crate::models::offer::{GeoPoint, Offer};

impl ActiveJob {
    /// Promotes an accepted offer. Earnings are passed in already computed so
    /// the record is fixed at acceptance.
    pub fn from_offer(offer: &Offer, earnings: EarningsRecord) -> Self {
        let now = Utc::now();

        Self {
            id: offer.id,
            phase: JobPhase::Pickup,
            pickup: offer.pickup.clone(),
            dropoff: offer.dropoff.clone(),
            worker_position: None,
            payment_method: offer.payment_method,
            distance_km: offer.distance_km,
            earnings,
            accepted_at: now,
            phase_history: vec![PhaseChange {
                phase: JobPhase::Pickup,
                at: now,
            }],
        }
    }

    /// Moves exactly one phase forward.
    pub fn advance_phase(&mut self) -> Result<JobPhase, AppError> {
        let next = self.phase.next().ok_or_else(|| {
            AppError::InvalidTransition(format!("job {} is already {}", self.id, self.phase))
        })?;

        self.phase = next;
        self.phase_history.push(PhaseChange {
            phase: next,
            at: Utc::now(),
        });

        Ok(next)
    }

    pub fn is_completed(&self) -> bool {
        self.phase == JobPhase::Completed
    }

    pub fn update_position(&mut self, position: GeoPoint) -> Result<(), AppError> {
        if !geo::in_range(&position) {
            return Err(AppError::BadRequest(format!(
                "coordinates out of range: ({}, {})",
                position.lat, position.lng
            )));
        }

        self.worker_position = Some(position);
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::earnings::EarningsRecord;
use crate::models::offer::{GeoPoint, PaymentMethod, Place};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Pickup,
    Delivery,
    Completed,
}

impl JobPhase {
    pub fn next(self) -> Option<JobPhase> {
        match self {
            JobPhase::Pickup => Some(JobPhase::Delivery),
            JobPhase::Delivery => Some(JobPhase::Completed),
            JobPhase::Completed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Pickup => "pickup",
            JobPhase::Delivery => "delivery",
            JobPhase::Completed => "completed",
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseChange {
    pub phase: JobPhase,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveJob {
    /// Same as the id of the accepted offer.
    pub id: Uuid,
    pub phase: JobPhase,
    pub pickup: Place,
    pub dropoff: Place,
    pub worker_position: Option<GeoPoint>,
    pub payment_method: PaymentMethod,
    pub distance_km: f64,
    pub earnings: EarningsRecord,
    pub accepted_at: DateTime<Utc>,
    pub phase_history: Vec<PhaseChange>,
}

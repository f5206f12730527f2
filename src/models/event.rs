use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::earnings::CompletedJob;
use crate::models::job::JobPhase;
use crate::models::offer::{Offer, Resolution};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    WentOnline {
        worker_id: Uuid,
        at: DateTime<Utc>,
    },
    WentOffline {
        worker_id: Uuid,
        at: DateTime<Utc>,
    },
    OfferPresented {
        worker_id: Uuid,
        offer: Offer,
        expires_at: DateTime<Utc>,
    },
    OfferResolved {
        worker_id: Uuid,
        offer_id: Uuid,
        outcome: Resolution,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        worker_id: Uuid,
        job_id: Uuid,
        phase: JobPhase,
        at: DateTime<Utc>,
    },
    JobCompleted {
        worker_id: Uuid,
        completed: CompletedJob,
    },
}

impl SessionEvent {
    pub fn worker_id(&self) -> Uuid {
        match self {
            SessionEvent::WentOnline { worker_id, .. }
            | SessionEvent::WentOffline { worker_id, .. }
            | SessionEvent::OfferPresented { worker_id, .. }
            | SessionEvent::OfferResolved { worker_id, .. }
            | SessionEvent::PhaseAdvanced { worker_id, .. }
            | SessionEvent::JobCompleted { worker_id, .. } => *worker_id,
        }
    }
}

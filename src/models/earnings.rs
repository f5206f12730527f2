use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::ActiveJob;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionBreakdown {
    pub platform_fee: u64,
}

/// Payout locked in when an offer is accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EarningsRecord {
    pub order_subtotal: u64,
    pub delivery_fee: u64,
    pub driver_net_earning: u64,
    pub commission: Option<CommissionBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedJob {
    pub job: ActiveJob,
    pub earnings: EarningsRecord,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub completed_jobs: usize,
    pub total_net_earning: u64,
    pub jobs: Vec<CompletedJob>,
}

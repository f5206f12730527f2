use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub label: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Wallet,
    CardGateway,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Resolution {
    Unresolved = 0,
    Accepted = 1,
    Rejected = 2,
    Expired = 3,
}

impl Resolution {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Resolution::Accepted,
            2 => Resolution::Rejected,
            3 => Resolution::Expired,
            _ => Resolution::Unresolved,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Unresolved => "unresolved",
            Resolution::Accepted => "accepted",
            Resolution::Rejected => "rejected",
            Resolution::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Resolution::Unresolved
    }
}

/// A job proposed to a single worker. Terms are fixed once the offer exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: Uuid,
    pub pickup: Place,
    pub dropoff: Place,
    /// Gross order value in minor currency units.
    pub order_value: u64,
    pub delivery_fee: u64,
    pub driver_net_earning: u64,
    pub payment_method: PaymentMethod,
    pub distance_km: f64,
    pub ttl_secs: u64,
    pub created_at: DateTime<Utc>,
}

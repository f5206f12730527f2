use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::geo::haversine_km;
use crate::models::offer::{GeoPoint, Offer, PaymentMethod, Place};

/// Produces candidate offers for the dispatcher. `None` means nothing this tick.
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn next(&self) -> Option<Offer>;
}

#[derive(Debug, Clone)]
pub struct OfferTemplate {
    pub pickup: Place,
    pub dropoff: Place,
    pub order_value: u64,
    pub delivery_fee: u64,
    pub driver_net_earning: u64,
    pub payment_method: PaymentMethod,
}

impl OfferTemplate {
    pub fn instantiate(&self, ttl: Duration) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
            order_value: self.order_value,
            delivery_fee: self.delivery_fee,
            driver_net_earning: self.driver_net_earning,
            payment_method: self.payment_method,
            distance_km: haversine_km(&self.pickup.location, &self.dropoff.location),
            ttl_secs: ttl.as_secs(),
            created_at: Utc::now(),
        }
    }
}

/// Cycles a fixed catalog, minting a fresh offer id every time.
pub struct RotatingOfferSource {
    templates: Vec<OfferTemplate>,
    cursor: AtomicUsize,
    ttl: Duration,
}

impl RotatingOfferSource {
    pub fn new(templates: Vec<OfferTemplate>, ttl: Duration) -> Self {
        Self {
            templates,
            cursor: AtomicUsize::new(0),
            ttl,
        }
    }

    pub fn with_default_catalog(ttl: Duration) -> Self {
        Self::new(default_catalog(), ttl)
    }
}

#[async_trait]
impl OfferSource for RotatingOfferSource {
    async fn next(&self) -> Option<Offer> {
        if self.templates.is_empty() {
            return None;
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.templates.len();
        Some(self.templates[index].instantiate(self.ttl))
    }
}

/// FIFO fed by the host, e.g. a matching-engine client.
#[derive(Default)]
pub struct QueuedOfferSource {
    queue: Mutex<VecDeque<Offer>>,
}

impl QueuedOfferSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, offer: Offer) {
        self.queue.lock().push_back(offer);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[async_trait]
impl OfferSource for QueuedOfferSource {
    async fn next(&self) -> Option<Offer> {
        self.queue.lock().pop_front()
    }
}

fn place(label: &str, lat: f64, lng: f64) -> Place {
    Place {
        label: label.to_string(),
        location: GeoPoint { lat, lng },
    }
}

fn default_catalog() -> Vec<OfferTemplate> {
    vec![
        OfferTemplate {
            pickup: place("Bakmi Jawa Pak Gito", -6.2297, 106.8295),
            dropoff: place("Apartemen Taman Rasuna Tower 5", -6.2213, 106.8336),
            order_value: 87_000,
            delivery_fee: 32_000,
            driver_net_earning: 29_247,
            payment_method: PaymentMethod::Wallet,
        },
        OfferTemplate {
            pickup: place("Kopi Kenangan Kuningan City", -6.2244, 106.8290),
            dropoff: place("Menara Imperium", -6.2089, 106.8331),
            order_value: 54_500,
            delivery_fee: 18_000,
            driver_net_earning: 15_300,
            payment_method: PaymentMethod::CardGateway,
        },
        OfferTemplate {
            pickup: place("Sate Khas Senayan", -6.2186, 106.8025),
            dropoff: place("Jl. Gatot Subroto Kav. 52", -6.2350, 106.8220),
            order_value: 142_000,
            delivery_fee: 27_500,
            driver_net_earning: 24_100,
            payment_method: PaymentMethod::Cash,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{OfferSource, QueuedOfferSource, RotatingOfferSource, default_catalog};

    #[tokio::test]
    async fn rotating_source_cycles_with_fresh_ids() {
        let source = RotatingOfferSource::with_default_catalog(Duration::from_secs(30));
        let catalog_len = default_catalog().len();

        let first = source.next().await.unwrap();
        for _ in 1..catalog_len {
            source.next().await.unwrap();
        }
        let wrapped = source.next().await.unwrap();

        assert_eq!(first.pickup, wrapped.pickup);
        assert_ne!(first.id, wrapped.id);
        assert_eq!(wrapped.ttl_secs, 30);
        assert!(first.distance_km > 0.0);
    }

    #[tokio::test]
    async fn empty_catalog_yields_nothing() {
        let source = RotatingOfferSource::new(Vec::new(), Duration::from_secs(30));
        assert!(source.next().await.is_none());
    }

    #[tokio::test]
    async fn queued_source_is_fifo() {
        let source = QueuedOfferSource::new();
        let catalog = default_catalog();
        let a = catalog[0].instantiate(Duration::from_secs(10));
        let b = catalog[1].instantiate(Duration::from_secs(10));
        source.push(a.clone());
        source.push(b.clone());

        assert_eq!(source.len(), 2);
        assert_eq!(source.next().await.unwrap().id, a.id);
        assert_eq!(source.next().await.unwrap().id, b.id);
        assert!(source.next().await.is_none());
        assert!(source.is_empty());
    }
}

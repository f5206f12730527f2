use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::engine::session::WorkerSession;
use crate::engine::source::OfferSource;

/// Polling task for one online worker. Aborted on `stop` or drop.
#[derive(Debug)]
pub struct DispatchHandle {
    handle: JoinHandle<()>,
}

impl DispatchHandle {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for DispatchHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn spawn_dispatcher(
    session: Weak<WorkerSession>,
    source: Arc<dyn OfferSource>,
    period: Duration,
) -> DispatchHandle {
    DispatchHandle {
        handle: tokio::spawn(run_dispatcher(session, source, period)),
    }
}

/// The first tick completes immediately, so a worker who just came online is
/// offered work without waiting a full period.
async fn run_dispatcher(
    session: Weak<WorkerSession>,
    source: Arc<dyn OfferSource>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(session) = session.upgrade() else {
            break;
        };
        if !session.is_dispatch_eligible() {
            continue;
        }

        match source.next().await {
            // Eligibility is re-checked under the session lock; a stale pull is dropped there.
            Some(offer) => {
                session.offer_arrived(offer);
            }
            None => debug!(worker_id = %session.worker_id(), "offer source had nothing"),
        }
    }

    info!("dispatcher stopped: session dropped");
}

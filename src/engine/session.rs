use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DispatchSettings;
use crate::engine::dispatcher::{DispatchHandle, spawn_dispatcher};
use crate::engine::earnings::compute_earnings;
use crate::engine::offer::PendingOffer;
use crate::engine::source::OfferSource;
use crate::engine::timer::ExpiryTimer;
use crate::error::AppError;
use crate::models::earnings::{CompletedJob, EarningsSummary};
use crate::models::event::SessionEvent;
use crate::models::job::{ActiveJob, JobPhase};
use crate::models::offer::{GeoPoint, Offer, Resolution};
use crate::observability::metrics::Metrics;

/// Services shared by every session.
pub struct SessionContext {
    pub source: Arc<dyn OfferSource>,
    pub settings: DispatchSettings,
    pub events_tx: broadcast::Sender<SessionEvent>,
    pub metrics: Metrics,
}

impl SessionContext {
    pub fn new(
        source: Arc<dyn OfferSource>,
        settings: DispatchSettings,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            source,
            settings,
            events_tx,
            metrics: Metrics::new(),
        }
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

/// What the worker is holding. One variant at a time, so a pending offer and
/// an active job can never coexist.
enum Slot {
    Idle,
    OfferPending {
        pending: Arc<PendingOffer>,
        timer: ExpiryTimer,
    },
    OnJob(ActiveJob),
}

struct SessionInner {
    online: bool,
    slot: Slot,
    dispatcher: Option<DispatchHandle>,
    resolved: VecDeque<Arc<PendingOffer>>,
    completed: Vec<CompletedJob>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    OfferPending {
        offer: Offer,
        seconds_remaining: u64,
        expires_at: DateTime<Utc>,
    },
    OnJob {
        job: ActiveJob,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub worker_id: Uuid,
    pub name: String,
    pub online: bool,
    #[serde(flatten)]
    pub state: SessionState,
}

pub struct WorkerSession {
    worker_id: Uuid,
    name: String,
    inner: Mutex<SessionInner>,
    ctx: Arc<SessionContext>,
}

impl WorkerSession {
    pub fn new(name: String, ctx: Arc<SessionContext>) -> Arc<Self> {
        Arc::new(Self {
            worker_id: Uuid::new_v4(),
            name,
            inner: Mutex::new(SessionInner {
                online: false,
                slot: Slot::Idle,
                dispatcher: None,
                resolved: VecDeque::new(),
                completed: Vec::new(),
            }),
            ctx,
        })
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    pub fn go_online(self: &Arc<Self>) -> Result<(), AppError> {
        let mut inner = self.inner.lock();

        if matches!(inner.slot, Slot::OnJob(_)) {
            return Err(AppError::PreconditionFailed(
                "finish your current job first".to_string(),
            ));
        }
        if inner.online {
            return Ok(());
        }

        inner.online = true;
        inner.dispatcher = Some(spawn_dispatcher(
            Arc::downgrade(self),
            self.ctx.source.clone(),
            self.ctx.settings.poll_period,
        ));

        self.ctx.metrics.workers_online.inc();
        self.ctx.publish(SessionEvent::WentOnline {
            worker_id: self.worker_id,
            at: Utc::now(),
        });
        info!(worker_id = %self.worker_id, "worker online");

        Ok(())
    }

    /// Idempotent. A pending offer is rejected; an active job blocks the call.
    pub fn go_offline(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock();

        if matches!(inner.slot, Slot::OnJob(_)) {
            return Err(AppError::PreconditionFailed(
                "cannot go offline during an active job".to_string(),
            ));
        }

        if let Slot::OfferPending { pending, .. } = &inner.slot {
            if let Err(err) = pending.reject() {
                debug!(
                    worker_id = %self.worker_id,
                    offer_id = %pending.id(),
                    reason = err.kind(),
                    "pending offer resolved before going offline"
                );
            }
        }
        self.detach_pending(&mut inner);

        if let Some(dispatcher) = inner.dispatcher.take() {
            dispatcher.stop();
        }

        if inner.online {
            inner.online = false;
            self.ctx.metrics.workers_online.dec();
            self.ctx.publish(SessionEvent::WentOffline {
                worker_id: self.worker_id,
                at: Utc::now(),
            });
            info!(worker_id = %self.worker_id, "worker offline");
        }

        Ok(())
    }

    pub fn current_state(&self) -> SessionView {
        let inner = self.inner.lock();

        let state = match &inner.slot {
            Slot::Idle => SessionState::Idle,
            Slot::OfferPending { pending, .. } => SessionState::OfferPending {
                offer: pending.offer().clone(),
                seconds_remaining: pending.seconds_remaining(),
                expires_at: pending.expires_at(),
            },
            Slot::OnJob(job) => SessionState::OnJob { job: job.clone() },
        };

        SessionView {
            worker_id: self.worker_id,
            name: self.name.clone(),
            online: inner.online,
            state,
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.lock().online
    }

    pub fn is_dispatch_eligible(&self) -> bool {
        let inner = self.inner.lock();
        inner.online && matches!(inner.slot, Slot::Idle)
    }

    /// Installs `offer` as the pending offer if the worker is still eligible.
    /// Returns false when the offer was discarded.
    pub fn offer_arrived(self: &Arc<Self>, offer: Offer) -> bool {
        let mut inner = self.inner.lock();

        if !inner.online || !matches!(inner.slot, Slot::Idle) {
            self.ctx.metrics.offers_discarded_total.inc();
            debug!(
                worker_id = %self.worker_id,
                offer_id = %offer.id,
                "worker no longer eligible; discarding offer"
            );
            return false;
        }

        let offer_id = offer.id;
        let pending = match PendingOffer::new(offer) {
            Ok(pending) => Arc::new(pending),
            Err(err) => {
                self.ctx.metrics.offers_discarded_total.inc();
                warn!(
                    worker_id = %self.worker_id,
                    offer_id = %offer_id,
                    error = %err,
                    "discarding offer"
                );
                return false;
            }
        };
        let session = Arc::downgrade(self);
        let timer = ExpiryTimer::arm(pending.deadline(), move || {
            if let Some(session) = session.upgrade() {
                session.expire_offer(offer_id);
            }
        });

        self.ctx.metrics.offers_presented_total.inc();
        self.ctx.publish(SessionEvent::OfferPresented {
            worker_id: self.worker_id,
            offer: pending.offer().clone(),
            expires_at: pending.expires_at(),
        });
        info!(
            worker_id = %self.worker_id,
            offer_id = %offer_id,
            net_earning = pending.offer().driver_net_earning,
            ttl_secs = pending.offer().ttl_secs,
            "offer presented"
        );

        inner.slot = Slot::OfferPending { pending, timer };
        true
    }

    pub fn accept_offer(&self, offer_id: Uuid) -> Result<ActiveJob, AppError> {
        let mut inner = self.inner.lock();
        let pending = self.pending_or_stale(&inner, offer_id)?;

        let offer = match pending.accept() {
            Ok(offer) => offer,
            Err(err) => {
                self.detach_pending(&mut inner);
                return Err(err);
            }
        };

        self.detach_pending(&mut inner);

        let job = ActiveJob::from_offer(&offer, compute_earnings(&offer));
        inner.slot = Slot::OnJob(job.clone());

        info!(
            worker_id = %self.worker_id,
            job_id = %job.id,
            net_earning = job.earnings.driver_net_earning,
            "offer accepted; job started"
        );

        Ok(job)
    }

    pub fn reject_offer(&self, offer_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock();
        let pending = self.pending_or_stale(&inner, offer_id)?;

        let outcome = pending.reject();
        self.detach_pending(&mut inner);
        outcome
    }

    /// Timer path. Losing the race to a user action is expected and not an error.
    pub fn expire_offer(&self, offer_id: Uuid) {
        let mut inner = self.inner.lock();

        let pending = match &inner.slot {
            Slot::OfferPending { pending, .. } if pending.id() == offer_id => pending.clone(),
            _ => {
                debug!(worker_id = %self.worker_id, offer_id = %offer_id, "offer already gone at expiry");
                return;
            }
        };

        if pending.expire().is_err() {
            debug!(worker_id = %self.worker_id, offer_id = %offer_id, "expiry lost the race");
        }
        self.detach_pending(&mut inner);
    }

    pub fn advance_job(&self, job_id: Uuid) -> Result<ActiveJob, AppError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let job = match &mut inner.slot {
            Slot::OnJob(job) if job.id == job_id => job,
            _ => return Err(self.missing_job(&inner.completed, job_id)),
        };

        let phase = job.advance_phase()?;
        let snapshot = job.clone();

        self.ctx
            .metrics
            .phase_advances_total
            .with_label_values(&[phase.as_str()])
            .inc();
        self.ctx.publish(SessionEvent::PhaseAdvanced {
            worker_id: self.worker_id,
            job_id,
            phase,
            at: Utc::now(),
        });

        if phase == JobPhase::Completed {
            inner.slot = Slot::Idle;
            self.archive(inner, snapshot.clone());
        } else {
            info!(worker_id = %self.worker_id, job_id = %job_id, phase = %phase, "job phase advanced");
        }

        Ok(snapshot)
    }

    pub fn update_position(&self, job_id: Uuid, position: GeoPoint) -> Result<ActiveJob, AppError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match &mut inner.slot {
            Slot::OnJob(job) if job.id == job_id => {
                job.update_position(position)?;
                Ok(job.clone())
            }
            _ => Err(self.missing_job(&inner.completed, job_id)),
        }
    }

    pub fn earnings(&self) -> EarningsSummary {
        let inner = self.inner.lock();

        EarningsSummary {
            completed_jobs: inner.completed.len(),
            total_net_earning: inner
                .completed
                .iter()
                .map(|done| done.earnings.driver_net_earning)
                .sum(),
            jobs: inner.completed.clone(),
        }
    }

    fn pending_or_stale(
        &self,
        inner: &SessionInner,
        offer_id: Uuid,
    ) -> Result<Arc<PendingOffer>, AppError> {
        if let Slot::OfferPending { pending, .. } = &inner.slot {
            if pending.id() == offer_id {
                return Ok(pending.clone());
            }
        }

        let remembered = inner.resolved.iter().find(|p| p.id() == offer_id);
        Err(match remembered.map(|p| p.resolution()) {
            Some(Resolution::Expired) => AppError::OfferExpired(offer_id.to_string()),
            Some(_) => AppError::AlreadyResolved(offer_id.to_string()),
            None => AppError::NotFound(format!(
                "offer {offer_id} not found for worker {}",
                self.worker_id
            )),
        })
    }

    fn missing_job(&self, completed: &[CompletedJob], job_id: Uuid) -> AppError {
        if completed.iter().any(|done| done.job.id == job_id) {
            AppError::InvalidTransition(format!("job {job_id} is already completed"))
        } else {
            AppError::NotFound(format!(
                "job {job_id} not found for worker {}",
                self.worker_id
            ))
        }
    }

    /// Clears a resolved pending offer from the slot, cancels its timer and
    /// remembers it for late callers. Unresolved offers are left in place.
    fn detach_pending(&self, inner: &mut SessionInner) {
        let resolved = matches!(
            &inner.slot,
            Slot::OfferPending { pending, .. } if pending.resolution().is_terminal()
        );
        if !resolved {
            return;
        }

        let Slot::OfferPending { pending, mut timer } = mem::replace(&mut inner.slot, Slot::Idle)
        else {
            return;
        };
        timer.cancel();

        let outcome = pending.resolution();
        self.ctx
            .metrics
            .offer_resolutions_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.ctx.publish(SessionEvent::OfferResolved {
            worker_id: self.worker_id,
            offer_id: pending.id(),
            outcome,
            at: Utc::now(),
        });
        info!(
            worker_id = %self.worker_id,
            offer_id = %pending.id(),
            outcome = outcome.as_str(),
            "offer resolved"
        );

        inner.resolved.push_back(pending);
        while inner.resolved.len() > self.ctx.settings.resolved_history.max(1) {
            inner.resolved.pop_front();
        }
    }

    fn archive(&self, inner: &mut SessionInner, job: ActiveJob) {
        let completed = CompletedJob {
            earnings: job.earnings,
            job,
            completed_at: Utc::now(),
        };

        self.ctx.metrics.jobs_completed_total.inc();
        self.ctx
            .metrics
            .driver_earnings_total
            .inc_by(completed.earnings.driver_net_earning);
        self.ctx.publish(SessionEvent::JobCompleted {
            worker_id: self.worker_id,
            completed: completed.clone(),
        });
        info!(
            worker_id = %self.worker_id,
            job_id = %completed.job.id,
            net_earning = completed.earnings.driver_net_earning,
            "job completed"
        );

        inner.completed.push(completed);
    }
}

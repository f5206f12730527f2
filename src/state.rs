use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::DispatchSettings;
use crate::engine::session::{SessionContext, WorkerSession};
use crate::engine::source::OfferSource;
use crate::error::AppError;
use crate::models::event::SessionEvent;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub sessions: DashMap<Uuid, Arc<WorkerSession>>,
    pub context: Arc<SessionContext>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn OfferSource>,
        settings: DispatchSettings,
        event_buffer_size: usize,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            context: Arc::new(SessionContext::new(source, settings, event_buffer_size)),
        }
    }

    pub fn register_worker(&self, name: String) -> Arc<WorkerSession> {
        let session = WorkerSession::new(name, self.context.clone());
        self.sessions.insert(session.worker_id(), session.clone());
        session
    }

    pub fn session(&self, worker_id: Uuid) -> Result<Arc<WorkerSession>, AppError> {
        self.sessions
            .get(&worker_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NoActiveSession(worker_id.to_string()))
    }

    pub fn metrics(&self) -> &Metrics {
        &self.context.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.context.events_tx.subscribe()
    }
}

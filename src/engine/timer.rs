use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// One-shot timer running `on_fire` at `deadline` unless cancelled first.
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: Option<JoinHandle<()>>,
}

impl ExpiryTimer {
    pub fn arm<F>(deadline: Instant, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            on_fire();
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

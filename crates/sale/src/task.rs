//! Start/stop bookkeeping for the background loops.
//!
//! Each [`TaskSlot::begin`] hands out a fresh [`RunToken`]. Stopping
//! deactivates only the token of the current run, so a loop that is still
//! winding down can never cancel the run that replaced it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::TaskError;

/// Liveness and shutdown signal of one run.
pub(crate) struct RunToken {
    active: AtomicBool,
    shutdown: Notify,
}

impl RunToken {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once this run is stopped.
    pub(crate) async fn stopped(&self) {
        self.shutdown.notified().await;
    }
}

#[derive(Default)]
pub(crate) struct TaskSlot {
    current: Mutex<Option<Arc<RunToken>>>,
}

impl TaskSlot {
    pub(crate) fn begin(&self, name: &'static str) -> Result<Arc<RunToken>, TaskError> {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|run| run.is_active()) {
            return Err(TaskError::AlreadyRunning(name));
        }
        let run = Arc::new(RunToken { active: AtomicBool::new(true), shutdown: Notify::new() });
        *current = Some(Arc::clone(&run));
        Ok(run)
    }

    /// Idempotent.
    pub(crate) fn stop(&self) {
        if let Some(run) = self.current.lock().take() {
            run.active.store(false, Ordering::SeqCst);
            run.shutdown.notify_one();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.current.lock().as_ref().is_some_and(|run| run.is_active())
    }
}

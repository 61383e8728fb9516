use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::types::transition_plan::TransitionPlan;

/// Handle to one armed wake. Cancelling is idempotent and does nothing once
/// the wake has fired.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: Uuid,
    delay: Duration,
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns `true` only for the call that stopped a wake still pending.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::SeqCst);
        let pending = first && !self.abort.is_finished();
        self.abort.abort();

        pending
    }

    /// True once the wake has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Runs `on_fire` once, `plan.until_change()` from now. Must be called from
/// within a tokio runtime.
pub fn arm_once<F>(plan: &TransitionPlan, on_fire: F) -> CancelHandle
where
    F: FnOnce() + Send + 'static,
{
    let delay = plan.until_change();
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        on_fire();
    });

    CancelHandle {
        id: Uuid::new_v4(),
        delay,
        abort: task.abort_handle(),
        cancelled: Arc::new(AtomicBool::new(false)),
    }
}

/// Owner-held slot for the single outstanding transition wake.
///
/// Arming replaces (and cancels) the previous wake. Dropping the timer
/// cancels whatever is still armed.
#[derive(Debug, Default)]
pub struct TransitionTimer {
    armed: Option<CancelHandle>,
}

impl TransitionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, plan: &TransitionPlan, on_fire: F) -> &CancelHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.armed.insert(arm_once(plan, on_fire))
    }

    /// Cancels the armed wake, returning its handle if it had not fired yet.
    pub fn cancel(&mut self) -> Option<CancelHandle> {
        let handle = self.armed.take()?;

        handle.cancel().then_some(handle)
    }
}

impl Drop for TransitionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// crates/monitor/src/navigation.rs
//! One-shot delayed navigation to the results view.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use autologin_types::{Job, JobStatus};

/// Delay between observing a completed job and navigating to its results.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(3000);

/// State machine of the delayed navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NavState {
    /// No completed status observed yet.
    Idle = 0,
    /// Timer pending.
    Armed = 1,
    /// Timer elapsed; exactly one navigation was issued.
    Fired = 2,
    /// Torn down before the timer elapsed; no navigation happened.
    Cancelled = 3,
}

impl NavState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => NavState::Idle,
            1 => NavState::Armed,
            2 => NavState::Fired,
            _ => NavState::Cancelled,
        }
    }
}

/// The navigation the timer fires: go to the results view for this job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub job_id: String,
}

/// Watches the reconciled job view and arms a single cancellable timer on
/// terminal success.
///
/// `completed` arms once (idempotent across repeated observations); `failed`
/// never arms — that path stays manual. The pending timer is a scoped
/// resource: [`NavigationController::cancel`] (also run on drop) releases it
/// deterministically, so no stray navigation can fire after teardown.
pub struct NavigationController {
    delay: Duration,
    state: Arc<AtomicU8>,
    cancel_tx: Option<oneshot::Sender<()>>,
    nav_tx: mpsc::UnboundedSender<Navigation>,
}

impl NavigationController {
    /// Controller plus the receiver its navigation fires on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        Self::with_delay(REDIRECT_DELAY)
    }

    pub fn with_delay(delay: Duration) -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                state: Arc::new(AtomicU8::new(NavState::Idle as u8)),
                cancel_tx: None,
                nav_tx,
            },
            nav_rx,
        )
    }

    pub fn state(&self) -> NavState {
        NavState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Feed one observation of the current job view.
    pub fn observe(&mut self, job: &Job) {
        if job.status != JobStatus::Completed {
            return;
        }
        if self.state() != NavState::Idle {
            // Already armed, fired, or torn down: never a second timer.
            return;
        }
        self.arm(job.id.clone());
    }

    fn arm(&mut self, job_id: String) {
        self.state.store(NavState::Armed as u8, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel_tx = Some(cancel_tx);

        debug!(%job_id, delay_ms = self.delay.as_millis() as u64, "navigation armed");

        let state = Arc::clone(&self.state);
        let nav_tx = self.nav_tx.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                // Cancellation beats a simultaneously-elapsed timer.
                biased;
                _ = cancel_rx => {
                    state.store(NavState::Cancelled as u8, Ordering::Relaxed);
                    debug!(%job_id, "navigation cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    state.store(NavState::Fired as u8, Ordering::Relaxed);
                    debug!(%job_id, "navigation fired");
                    let _ = nav_tx.send(Navigation { job_id });
                }
            }
        });
    }

    /// Release the pending timer, if any. After the timer has fired this is
    /// a no-op; the state stays `Fired`.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // Send succeeding means the timer task is still waiting and will
            // take the cancellation branch; reflect that state immediately.
            if tx.send(()).is_ok() {
                self.state.store(NavState::Cancelled as u8, Ordering::Relaxed);
            }
        }
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.cancel();
    }
}

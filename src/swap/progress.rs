//! Visible progress of the in-flight transaction
//!
//! The tracker only holds state: the orchestrator drives it, a UI observes it
//! through [`ProgressTracker::subscribe`] (latest state) or
//! [`ProgressTracker::subscribe_events`] (every transition).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

/// Kinds of user-initiated operations, each with a fixed number of steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    OptIn,
    Donation,
    CreateOffer,
    AcceptOffer,
    CancelOffer,
}

impl OperationKind {
    pub fn total_steps(&self) -> u8 {
        match self {
            OperationKind::OptIn | OperationKind::Donation => 3,
            OperationKind::CreateOffer | OperationKind::AcceptOffer | OperationKind::CancelOffer => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::OptIn => "opt-in",
            OperationKind::Donation => "donation",
            OperationKind::CreateOffer => "swap offer",
            OperationKind::AcceptOffer => "swap acceptance",
            OperationKind::CancelOffer => "swap cancellation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub step: u8,
    pub total_steps: u8,
    pub message: String,
}

impl ProgressState {
    pub fn idle(total_steps: u8) -> Self {
        Self { step: 0, total_steps, message: String::new() }
    }

    pub fn is_idle(&self) -> bool {
        self.step == 0
    }

    pub fn percent(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        f64::from(self.step) / f64::from(self.total_steps) * 100.0
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::idle(OperationKind::OptIn.total_steps())
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveOperation {
    kind: OperationKind,
    step: u8,
}

struct Shared {
    state: watch::Sender<ProgressState>,
    events: broadcast::Sender<ProgressState>,
    active: Mutex<Option<ActiveOperation>>,
    /// Bumped by every `begin`, so a stale delayed reset never clears a newer operation
    generation: AtomicU64,
}

impl Shared {
    fn publish(&self, state: ProgressState) {
        debug!(step = state.step, total = state.total_steps, message = %state.message, "progress");
        self.state.send_replace(state.clone());
        // no subscribers is fine
        let _ = self.events.send(state);
    }

    fn reset(&self) {
        let total = {
            let mut active = self.active.lock();
            active.take().map(|op| op.kind.total_steps())
        };
        let total = total.unwrap_or_else(|| self.state.borrow().total_steps);
        self.publish(ProgressState::idle(total));
    }
}

pub struct ProgressTracker {
    shared: Arc<Shared>,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ProgressState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state,
                events,
                active: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            pending_reset: Mutex::new(None),
        }
    }

    pub fn current(&self) -> ProgressState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.shared.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ProgressState> {
        self.shared.events.subscribe()
    }

    pub fn active_operation(&self) -> Option<OperationKind> {
        (*self.shared.active.lock()).map(|op| op.kind)
    }

    /// Start tracking a new operation; a pending delayed reset is dropped
    pub fn begin(&self, kind: OperationKind) {
        self.cancel_pending_reset();
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        *self.shared.active.lock() = Some(ActiveOperation { kind, step: 0 });
    }

    /// Move to `step`. Steps must strictly increase within one operation and
    /// stay within the operation's total; anything else is ignored.
    pub fn advance(&self, step: u8, message: impl Into<String>) -> bool {
        let total = {
            let mut active = self.shared.active.lock();
            let Some(op) = active.as_mut() else {
                warn!(step, "progress advanced with no active operation");
                return false;
            };
            let total = op.kind.total_steps();
            if step <= op.step || step > total {
                warn!(step, current = op.step, total, "rejected non-monotonic progress step");
                return false;
            }
            op.step = step;
            total
        };
        self.shared.publish(ProgressState { step, total_steps: total, message: message.into() });
        true
    }

    /// Success: keep the final step visible for `delay`, then go idle
    pub fn complete(&self, delay: Duration) {
        self.cancel_pending_reset();
        if delay.is_zero() {
            self.shared.reset();
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.shared.reset();
            return;
        };

        let shared = self.shared.clone();
        let generation = shared.generation.load(Ordering::Acquire);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.generation.load(Ordering::Acquire) == generation {
                shared.reset();
            }
        });
        *self.pending_reset.lock() = Some(handle);
    }

    /// Failure: go idle immediately
    pub fn fail(&self) {
        self.cancel_pending_reset();
        self.shared.reset();
    }

    pub fn reset(&self) {
        self.fail();
    }

    pub fn has_pending_reset(&self) -> bool {
        self.pending_reset.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel_pending_reset(&self) {
        if let Some(handle) = self.pending_reset.lock().take() {
            handle.abort();
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.cancel_pending_reset();
    }
}

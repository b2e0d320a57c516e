//! The single cooperative-cancellation primitive shared by the miner loop
//! and the overlay's shutdown path: a flag that also wakes up anything
//! `await`-ing on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A flag that can be set once to request cooperative shutdown, plus a
/// `Notify` so async waiters don't have to poll it.
#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    notify: Notify,
}

/// Cheaply clonable handle to a shared stop flag.
#[derive(Clone, Default)]
pub struct StopHandle(Arc<Inner>);

impl StopHandle {
    pub fn new() -> Self {
        StopHandle(Arc::new(Inner::default()))
    }

    /// Requests shutdown and wakes every task currently awaiting
    /// [`StopHandle::wait`].
    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Non-blocking check, used at safe points between mining rounds and
    /// inside worker threads for intra-round preemption.
    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Resolves as soon as [`StopHandle::stop`] is called, or immediately
    /// if it already has been.
    pub async fn wait(&self) {
        if self.is_stopped() {
            return;
        }
        let notified = self.0.notify.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::Notify;

use crate::error::Result;

/// Collapses bursts of triggers into at most one action per quiet period.
///
/// The first [`trigger`](Debounce::trigger) of a burst arms a background
/// worker; the worker waits `quiet` measured from that first call, runs the
/// action exactly once, then disarms. Triggers arriving while armed are
/// coalesced: they neither fire again nor extend the delay.
#[derive(Clone)]
pub struct Debounce {
    inner: Arc<Inner>,
}

struct Inner {
    armed: AtomicBool,
    wakeup: Notify,
    action: Box<dyn Fn() -> Result<()> + Send + Sync>,
}

impl Debounce {
    /// Create the trigger and spawn its worker task. Must be called from
    /// within a tokio runtime.
    pub fn new<F>(quiet: Duration, action: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let inner = Arc::new(Inner {
            armed: AtomicBool::new(false),
            wakeup: Notify::new(),
            action: Box::new(action),
        });

        let worker = Arc::clone(&inner);
        tokio::spawn(async move {
            loop {
                worker.wakeup.notified().await;
                tokio::time::sleep(quiet).await;
                if let Err(e) = (worker.action)() {
                    warn!("debounced action failed: {e}");
                }
                // Disarm only after the action completes; triggers that
                // arrived in between were part of this burst.
                worker.armed.store(false, Ordering::SeqCst);
            }
        });

        Self { inner }
    }

    /// Record that the action is wanted. Safe to call from any thread,
    /// including non-async watcher callbacks.
    pub fn trigger(&self) {
        if !self.inner.armed.swap(true, Ordering::SeqCst) {
            self.inner.wakeup.notify_one();
        }
    }

    /// Run the action synchronously on the caller, bypassing the timer and
    /// the armed state. Used once at startup.
    pub fn immediate(&self) -> Result<()> {
        (self.inner.action)()
    }
}

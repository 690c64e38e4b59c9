//! Trailing-edge debounce timer for the derived total
//!
//! Each new input supersedes the pending timer; only a quiet window lets
//! the timer fire. The fire is delivered over a channel polled by the
//! event loop, and a generation counter discards anything staged by a
//! superseded timer so a stale fire can never reach a discarded form
//! instance.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<u64>,
    rx: mpsc::UnboundedReceiver<u64>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            tx,
            rx,
            pending: None,
            generation: 0,
        }
    }

    /// Register an input event: abort any pending timer and start a new one.
    pub fn touch(&mut self) {
        self.abort_pending();
        self.generation = self.generation.wrapping_add(1);

        let tx = self.tx.clone();
        let generation = self.generation;
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the owner was torn down; nothing to do.
            let _ = tx.send(generation);
        }));
    }

    /// Poll for a completed quiet window. Returns true at most once per
    /// window; fires from superseded timers are discarded.
    pub fn try_fire(&mut self) -> bool {
        let mut fired = false;
        while let Ok(generation) = self.rx.try_recv() {
            if generation == self.generation {
                fired = true;
            }
        }
        fired
    }

    /// Drop any pending timer without firing. Used on form reset/teardown.
    pub fn cancel(&mut self) {
        self.abort_pending();
        // Invalidate anything a just-completed timer may have queued.
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a timer is currently pending (may already have completed).
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

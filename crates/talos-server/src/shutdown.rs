//! Shutdown coordination primitives.
//!
//! Two pieces cooperate during shutdown: a [`ShutdownSignal`] fans the
//! stop request out to every task, and a [`ConnectionTracker`] tells the
//! drain phase when the last in-flight connection has finished.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// A cloneable one-shot stop flag.
///
/// All clones observe the same trigger; triggering more than once is a
/// no-op. Waiters that subscribe after the trigger complete immediately.
///
/// # Example
///
/// ```rust
/// use talos_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(observer.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Fires the signal. Idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Send fails only when nobody is subscribed, which is fine.
            let _ = self.sender.send(());
        }
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Completes when the signal fires; immediately if it already has.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // Check after subscribing so a trigger between the two is not lost.
        if self.is_triggered() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts live connections so drain knows when to finish.
///
/// The accept loop takes a [`ConnectionToken`] per connection; dropping
/// the token releases it. [`ConnectionTracker::drained`] resolves once the
/// count reaches zero.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no live connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one connection. Hold the token for its whole lifetime.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves when every token has been dropped.
    ///
    /// Completes immediately when nothing is in flight.
    pub async fn drained(&self) {
        loop {
            // Arm the wakeup before reading the count so a token dropped in
            // between cannot slip past unobserved.
            let notified = self.notify.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight connection finished.
    Completed,
    /// The deadline expired first.
    DeadlineExpired {
        /// Connections still open when the drain gave up.
        abandoned: usize,
    },
    /// A second stop signal cut the drain short.
    Forced {
        /// Connections still open when the drain was cut short.
        abandoned: usize,
    },
}

/// RAII registration of one live connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

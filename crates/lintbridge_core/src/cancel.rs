//! Cancellation signal shared by a session and its subprocesses.
//!
//! Superseded work ends in [`Outcome::Canceled`] rather than an error.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable, idempotent cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelSignal(Arc<watch::Sender<bool>>);

impl CancelSignal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self(Arc::new(tx))
    }

    /// Fires the signal. Firing twice is a no-op.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// Returns true once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves when the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.0.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Result of work that can be superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Finished(T),
    /// Canceled before finishing. Never an error and never reported.
    Canceled,
}

impl<T> Outcome<T> {
    /// Returns the finished value, if any.
    pub fn finished(self) -> Option<T> {
        match self {
            Outcome::Finished(value) => Some(value),
            Outcome::Canceled => None,
        }
    }

    /// Returns true if the work was canceled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled)
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

//! Cooperative cancellation threaded through every dispatch layer.
//!
//! The dispatcher never checks the token itself; it hands the caller's token
//! to every decorator and handler unchanged. Handlers that honour
//! cancellation return [`Cancelled`] through [`CancellationToken::check`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Error returned by handlers that stop because their token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Signal {
    cancelled: AtomicBool,
    parent: Option<Arc<Signal>>,
}

impl Signal {
    fn is_set(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.parent.as_ref().is_some_and(|parent| parent.is_set())
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag. Child tokens observe their parent but
/// cancelling a child leaves the parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled whenever `self` is.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            signal: Arc::new(Signal {
                cancelled: AtomicBool::new(false),
                parent: Some(Arc::clone(&self.signal)),
            }),
        }
    }

    /// Requests cancellation of all work observing this token.
    pub fn cancel(&self) {
        self.signal.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once this token or any ancestor has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_set()
    }

    /// Returns [`Cancelled`] when cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Fails once this token or any ancestor has been cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

//! Operation context carrying cancellation and an optional deadline

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] stopped allowing work
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Context passed to every pool operation.
///
/// A context resolves when its cancellation token fires or its deadline
/// passes, whichever comes first. Cloning a context shares the token, so
/// cancelling any clone cancels them all; use [`Context::child`] for a
/// context that can be cancelled on its own.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{Context, ContextError};
///
/// let ctx = Context::background();
/// assert_eq!(ctx.err(), None);
///
/// ctx.cancel();
/// assert_eq!(ctx.err(), Some(ContextError::Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline that is only resolved by [`Context::cancel`]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context driven by an existing cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            deadline: None,
        }
    }

    /// Derive a context that is cancelled with this one but can also be
    /// cancelled independently. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    /// Shorten (never extend) the deadline of this context
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(current) if current < candidate => current,
            _ => candidate,
        });
        self
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Non-blocking check. Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancellation.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or past its deadline
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancellation.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.cancellation.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

//! Permit-based admission control

use tokio::sync::{Semaphore, TryAcquireError};

use crate::context::{Context, ContextError};

/// Result of trying to take a permit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Granted,
    Unavailable,
    Closed,
}

/// Bounds how many resources may be checked out at once.
///
/// Holds exactly `limit` permits. A granted permit is detached from the
/// semaphore and only comes back through [`AdmissionController::release_permit`],
/// so the pool decides when a permit is returned, not a guard's scope.
pub(crate) struct AdmissionController {
    semaphore: Semaphore,
    limit: usize,
}

impl AdmissionController {
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Semaphore::new(limit),
            limit,
        }
    }

    pub fn try_acquire_permit(&self) -> Admission {
        match self.semaphore.try_acquire() {
            Ok(permit) => {
                permit.forget();
                Admission::Granted
            }
            Err(TryAcquireError::NoPermits) => Admission::Unavailable,
            Err(TryAcquireError::Closed) => Admission::Closed,
        }
    }

    /// Wait for a permit until one is free, the controller closes, or `ctx`
    /// resolves. Never returns `Admission::Unavailable`.
    pub async fn acquire_permit(&self, ctx: &Context) -> Result<Admission, ContextError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        tokio::select! {
            acquired = self.semaphore.acquire() => match acquired {
                Ok(permit) => {
                    permit.forget();
                    Ok(Admission::Granted)
                }
                Err(_) => Ok(Admission::Closed),
            },
            err = ctx.done() => Err(err),
        }
    }

    /// Give a permit back. Extra releases beyond `limit` are dropped.
    ///
    /// Callers serialize releases under the pool lock; acquisitions only
    /// ever lower the count, so the check cannot overshoot.
    pub fn release_permit(&self) {
        if self.semaphore.is_closed() {
            return;
        }
        if self.semaphore.available_permits() < self.limit {
            self.semaphore.add_permits(1);
        }
    }

    /// Fail every pending and future acquisition with `Admission::Closed`
    pub fn close(&self) {
        self.semaphore.close();
    }

    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

//! Wake-up primitive for callers parked on an exhausted pool

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::context::{Context, ContextError};

/// Why a parked caller woke up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeReason {
    /// A resource was pushed to the free list or capacity was freed
    Available,
    /// The pool is closing; nothing will be handed out
    Closing,
}

/// Parking spot for callers waiting on the free list.
///
/// Availability and closing travel on separate primitives. A woken caller
/// learns which one fired and never mistakes shutdown for a delivery.
pub(crate) struct HandOff {
    available: Notify,
    closing: CancellationToken,
}

impl HandOff {
    pub fn new() -> Self {
        Self {
            available: Notify::new(),
            closing: CancellationToken::new(),
        }
    }

    /// Wake one parked caller, or leave a wake-up for the next one to park
    pub fn notify_one(&self) {
        self.available.notify_one();
    }

    pub fn close(&self) {
        self.closing.cancel();
    }

    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Register interest now, wait later.
    ///
    /// Called while the pool lock is held so that a push made between
    /// unlocking and awaiting still reaches this caller.
    pub fn park(&self) -> Parked<'_> {
        let mut notified = Box::pin(self.available.notified());
        notified.as_mut().enable();
        Parked {
            handoff: self,
            notified,
        }
    }
}

impl Default for HandOff {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Parked<'a> {
    handoff: &'a HandOff,
    notified: std::pin::Pin<Box<tokio::sync::futures::Notified<'a>>>,
}

impl Parked<'_> {
    /// Closing is checked before availability on every poll.
    pub async fn wait(mut self, ctx: &Context) -> Result<WakeReason, ContextError> {
        if self.handoff.is_closing() {
            return Ok(WakeReason::Closing);
        }

        tokio::select! {
            biased;
            _ = self.handoff.closing.cancelled() => Ok(WakeReason::Closing),
            _ = self.notified.as_mut() => Ok(WakeReason::Available),
            err = ctx.done() => Err(err),
        }
    }
}

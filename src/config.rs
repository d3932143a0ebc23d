//! Pool configuration options

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::errors::PoolError;
use crate::eviction::EvictionPolicy;

/// Builds the error returned for a closed or exhausted pool
pub type ErrorFactory<E> = Arc<dyn Fn(&Context) -> PoolError<E> + Send + Sync>;

/// Decides whether an idle resource is still fit to hand out
pub type LivenessCheck<R> = Arc<dyn Fn(&Context, &R) -> bool + Send + Sync>;

/// Configuration for resource pool behavior
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{PoolConfiguration, PoolError};
/// use std::io;
///
/// let config = PoolConfiguration::<u32, io::Error>::new()
///     .with_fast_fail()
///     .with_closed_error(|_ctx| {
///         PoolError::Custom(io::Error::new(io::ErrorKind::NotConnected, "shutting down"))
///     })
///     .with_liveness_check(|_ctx, conn: &u32| *conn != 0);
///
/// assert!(config.fast_fail);
/// assert!(config.closed_error.is_some());
/// assert!(config.exhausted_error.is_none());
/// ```
pub struct PoolConfiguration<R, E> {
    /// Return an error instead of waiting when every resource is in use
    pub fast_fail: bool,

    /// Error for `take` on an exhausted pool in fast-fail mode
    pub exhausted_error: Option<ErrorFactory<E>>,

    /// Error for `take` on a closed pool
    pub closed_error: Option<ErrorFactory<E>>,

    /// Checked on every idle resource before it is reused
    pub liveness_check: Option<LivenessCheck<R>>,

    /// Skip permit accounting; waiters park on the free list instead
    pub disable_admission_control: bool,

    /// Expiry for idle resources
    pub eviction_policy: EvictionPolicy,
}

impl<R, E> Default for PoolConfiguration<R, E> {
    fn default() -> Self {
        Self {
            fast_fail: false,
            exhausted_error: None,
            closed_error: None,
            liveness_check: None,
            disable_admission_control: false,
            eviction_policy: EvictionPolicy::None,
        }
    }
}

impl<R, E> Clone for PoolConfiguration<R, E> {
    fn clone(&self) -> Self {
        Self {
            fast_fail: self.fast_fail,
            exhausted_error: self.exhausted_error.clone(),
            closed_error: self.closed_error.clone(),
            liveness_check: self.liveness_check.clone(),
            disable_admission_control: self.disable_admission_control,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<R, E> fmt::Debug for PoolConfiguration<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("fast_fail", &self.fast_fail)
            .field("exhausted_error", &self.exhausted_error.is_some())
            .field("closed_error", &self.closed_error.is_some())
            .field("liveness_check", &self.liveness_check.is_some())
            .field("disable_admission_control", &self.disable_admission_control)
            .field("eviction_policy", &self.eviction_policy)
            .finish()
    }
}

impl<R, E> PoolConfiguration<R, E> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with an exhausted error instead of blocking
    pub fn with_fast_fail(mut self) -> Self {
        self.fast_fail = true;
        self
    }

    /// Set the factory for the exhausted error
    pub fn with_exhausted_error<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Context) -> PoolError<E> + Send + Sync + 'static,
    {
        self.exhausted_error = Some(Arc::new(factory));
        self
    }

    /// Set the factory for the closed error
    pub fn with_closed_error<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Context) -> PoolError<E> + Send + Sync + 'static,
    {
        self.closed_error = Some(Arc::new(factory));
        self
    }

    /// Validate idle resources before reuse; failing ones are destroyed
    pub fn with_liveness_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Context, &R) -> bool + Send + Sync + 'static,
    {
        self.liveness_check = Some(Arc::new(check));
        self
    }

    /// Turn off permit-based admission control.
    ///
    /// Callers then compete for the free list directly, with no ordering
    /// between a freed resource and the next blocked caller.
    pub fn without_admission_control(mut self) -> Self {
        self.disable_admission_control = true;
        self
    }

    /// Expire resources idle for longer than `timeout`
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.eviction_policy = EvictionPolicy::IdleTimeout(timeout);
        self
    }

    pub(crate) fn closed_error(&self, ctx: &Context) -> PoolError<E> {
        match &self.closed_error {
            Some(factory) => factory(ctx),
            None => PoolError::Closed,
        }
    }

    pub(crate) fn exhausted_error(&self, ctx: &Context) -> PoolError<E> {
        match &self.exhausted_error {
            Some(factory) => factory(ctx),
            None => PoolError::Exhausted,
        }
    }

    pub(crate) fn is_alive(&self, ctx: &Context, resource: &R) -> bool {
        match &self.liveness_check {
            Some(check) => check(ctx, resource),
            None => true,
        }
    }
}

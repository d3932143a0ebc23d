//! Eviction of resources that sat idle too long

use std::time::Duration;
use tokio::time::Instant;

/// Eviction policy for idle resources
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{EvictionPolicy, PoolConfiguration};
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::<u32, Infallible>::new()
///     .with_idle_timeout(Duration::from_secs(300));
///
/// assert!(matches!(config.eviction_policy, EvictionPolicy::IdleTimeout(_)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Idle resources are kept until the pool closes
    #[default]
    None,

    /// Idle resources expire after resting in the free list this long
    IdleTimeout(Duration),
}

impl EvictionPolicy {
    pub fn is_expired(&self, idle_since: Instant, now: Instant) -> bool {
        match self {
            EvictionPolicy::None => false,
            EvictionPolicy::IdleTimeout(timeout) => now.saturating_duration_since(idle_since) > *timeout,
        }
    }
}

/// A resource resting in the free list
#[derive(Debug)]
pub(crate) struct IdleEntry<R> {
    pub resource: R,
    pub idle_since: Instant,
}

impl<R> IdleEntry<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            idle_since: Instant::now(),
        }
    }
}

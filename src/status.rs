//! Point-in-time pool statistics

use std::collections::HashMap;
use std::time::Duration;

/// Snapshot of pool counters, read under the shared lock
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolStatus;
/// use std::time::Duration;
///
/// let status = PoolStatus {
///     limit: 4,
///     active: 3,
///     idle: 1,
///     waiting: 0,
///     average_wait_duration: Duration::ZERO,
/// };
///
/// assert_eq!(status.using(), 2);
/// assert_eq!(status.utilization(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolStatus {
    /// Maximum number of resources the pool may hold
    pub limit: usize,

    /// Live resources, idle or checked out
    pub active: usize,

    /// Resources resting in the free list
    pub idle: usize,

    /// Callers currently blocked in `take`
    pub waiting: usize,

    /// Mean time a blocked `take` waited before a resource came free
    pub average_wait_duration: Duration,
}

impl PoolStatus {
    /// Resources currently checked out
    pub fn using(&self) -> usize {
        self.active.saturating_sub(self.idle)
    }

    /// Checked-out share of `limit` (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.limit > 0 {
            self.using() as f64 / self.limit as f64
        } else {
            0.0
        }
    }

    /// Export the snapshot as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut status = HashMap::new();
        status.insert("limit".to_string(), self.limit.to_string());
        status.insert("active".to_string(), self.active.to_string());
        status.insert("idle".to_string(), self.idle.to_string());
        status.insert("using".to_string(), self.using().to_string());
        status.insert("waiting".to_string(), self.waiting.to_string());
        status.insert(
            "average_wait_ms".to_string(),
            format!("{:.3}", self.average_wait_duration.as_secs_f64() * 1000.0),
        );
        status.insert("utilization".to_string(), format!("{:.2}", self.utilization()));
        status
    }
}

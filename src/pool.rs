//! Core resource pool implementation

use crate::admission::{Admission, AdmissionController};
use crate::config::PoolConfiguration;
use crate::context::Context;
use crate::errors::{PoolError, PoolResult};
use crate::eviction::IdleEntry;
use crate::free_list::FreeList;
use crate::handoff::{HandOff, Parked, WakeReason};
use crate::manager::ResourceManager;
use crate::status::PoolStatus;

use parking_lot::RwLock;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

type ManagerResult<T, M> = PoolResult<T, <M as ResourceManager>::Error>;

/// Counters and idle resources, guarded by one lock
struct PoolState<R> {
    free: FreeList<IdleEntry<R>>,
    active: usize,
    waiting: usize,
    total_waited: u64,
    total_waited_duration: Duration,
    closed: bool,
}

struct PoolInner<M: ResourceManager> {
    manager: M,
    config: PoolConfiguration<M::Resource, M::Error>,
    limit: usize,
    state: RwLock<PoolState<M::Resource>>,
    admission: Option<AdmissionController>,
    handoff: HandOff,
}

/// Why `take` is turned away without a resource
enum Refusal {
    Closed,
    Exhausted,
}

/// What `take` does once it holds the lock
enum Step<'a, M: ResourceManager> {
    Reuse(IdleEntry<M::Resource>),
    Create(Slot<'a, M>),
    Wait(Parked<'a>, Waiting<'a, M>),
}

impl<M: ResourceManager> PoolInner<M> {
    /// Hand back a checked-out slot that no longer has a resource behind it
    fn release_slot(&self, state: &mut PoolState<M::Resource>) {
        if state.closed {
            return;
        }
        state.active = state.active.saturating_sub(1);
        if let Some(admission) = &self.admission {
            admission.release_permit();
        }
        self.handoff.notify_one();
    }

    /// Fold the time a successful `take` spent blocked into the statistics
    fn record_wait(&self, waited: Option<Duration>) {
        let Some(waited) = waited else {
            return;
        };
        let mut state = self.state.write();
        if !state.closed {
            state.total_waited += 1;
            state.total_waited_duration += waited;
        }
    }

    fn refuse(&self, ctx: &Context, refusal: Refusal) -> PoolError<M::Error> {
        match refusal {
            Refusal::Closed => self.config.closed_error(ctx),
            Refusal::Exhausted => self.config.exhausted_error(ctx),
        }
    }

    /// Destroy every resource, returning the first failure
    async fn destroy_all(
        &self,
        ctx: &Context,
        entries: Vec<IdleEntry<M::Resource>>,
    ) -> ManagerResult<(), M> {
        let mut first_error = None;
        for entry in entries {
            if let Err(err) = self.manager.destroy(ctx, entry.resource).await {
                warn!(error = %err, "failed to destroy idle resource");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(PoolError::Destroy(err)),
            None => Ok(()),
        }
    }
}

/// A checked-out slot held by an in-flight `take` while it creates a
/// resource. Dropped without [`Slot::keep`], the slot is handed back.
struct Slot<'a, M: ResourceManager> {
    inner: &'a PoolInner<M>,
    kept: bool,
}

impl<'a, M: ResourceManager> Slot<'a, M> {
    fn new(inner: &'a PoolInner<M>) -> Self {
        Self { inner, kept: false }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl<M: ResourceManager> Drop for Slot<'_, M> {
    fn drop(&mut self) {
        if !self.kept {
            let mut state = self.inner.state.write();
            self.inner.release_slot(&mut state);
        }
    }
}

/// One caller counted in `waiting`. Must be finished under the lock;
/// dropping it unfinished (the `take` future was dropped) uncounts it.
struct Waiting<'a, M: ResourceManager> {
    inner: &'a PoolInner<M>,
    started: Instant,
    finished: bool,
}

impl<'a, M: ResourceManager> Waiting<'a, M> {
    /// Count a new waiter. Caller holds the lock.
    fn start(inner: &'a PoolInner<M>, state: &mut PoolState<M::Resource>) -> Self {
        state.waiting += 1;
        Self {
            inner,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Uncount the waiter and report how long it waited
    fn finish(mut self, state: &mut PoolState<M::Resource>) -> Duration {
        self.finished = true;
        if !state.closed {
            state.waiting = state.waiting.saturating_sub(1);
        }
        self.started.elapsed()
    }
}

impl<M: ResourceManager> Drop for Waiting<'_, M> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.inner.state.write();
            if !state.closed {
                state.waiting = state.waiting.saturating_sub(1);
            }
        }
    }
}

/// Bounded pool of reusable resources.
///
/// At most `limit` resources exist at once. `take` reuses an idle resource,
/// creates a new one while under the limit, or else waits (or fails fast,
/// if configured). `put` hands a resource back for reuse. `close` destroys
/// every idle resource and refuses further `take` calls.
///
/// Cloning a pool is cheap and yields another handle to the same pool.
pub struct Pool<M: ResourceManager> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ResourceManager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ResourceManager> fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<M: ResourceManager> Pool<M> {
    /// Create a pool holding at most `limit` resources.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    pub fn new(limit: usize, manager: M, config: PoolConfiguration<M::Resource, M::Error>) -> Self {
        assert!(limit > 0, "pool limit must be greater than zero");

        let admission = if config.disable_admission_control {
            None
        } else {
            Some(AdmissionController::new(limit))
        };

        debug!(
            limit,
            fast_fail = config.fast_fail,
            admission_control = admission.is_some(),
            "creating resource pool"
        );

        Self {
            inner: Arc::new(PoolInner {
                manager,
                config,
                limit,
                state: RwLock::new(PoolState {
                    free: FreeList::with_capacity(limit),
                    active: 0,
                    waiting: 0,
                    total_waited: 0,
                    total_waited_duration: Duration::ZERO,
                    closed: false,
                }),
                admission,
                handoff: HandOff::new(),
            }),
        }
    }

    /// Take a resource out of the pool.
    ///
    /// The resource belongs to the caller until it is handed back with
    /// [`Pool::put`]. Context errors are returned as they are.
    ///
    /// Time spent blocked counts toward the average wait only when a
    /// resource is returned.
    pub async fn take(&self, ctx: &Context) -> ManagerResult<M::Resource, M> {
        let inner = &*self.inner;
        let mut waited: Option<Duration> = None;

        loop {
            if let Some(admission) = &inner.admission
                && let Some(elapsed) = self.admit(admission, ctx).await?
            {
                *waited.get_or_insert(Duration::ZERO) += elapsed;
            }

            let step = {
                let mut state = inner.state.write();
                if state.closed {
                    Err(Refusal::Closed)
                } else if let Some(entry) = state.free.pop() {
                    Ok(Step::Reuse(entry))
                } else if state.active < inner.limit {
                    state.active += 1;
                    Ok(Step::Create(Slot::new(inner)))
                } else {
                    // Only reachable without admission control: a permit
                    // guarantees either an idle resource or spare capacity.
                    if let Some(admission) = &inner.admission {
                        admission.release_permit();
                    }
                    if inner.config.fast_fail {
                        Err(Refusal::Exhausted)
                    } else {
                        let parked = inner.handoff.park();
                        Ok(Step::Wait(parked, Waiting::start(inner, &mut state)))
                    }
                }
            };

            match step.map_err(|refusal| inner.refuse(ctx, refusal))? {
                Step::Reuse(entry) => {
                    let expired = inner
                        .config
                        .eviction_policy
                        .is_expired(entry.idle_since, Instant::now());
                    if !expired && inner.config.is_alive(ctx, &entry.resource) {
                        trace!("reusing idle resource");
                        inner.record_wait(waited);
                        return Ok(entry.resource);
                    }

                    {
                        let mut state = inner.state.write();
                        inner.release_slot(&mut state);
                    }
                    debug!(expired, "destroying stale idle resource");
                    inner
                        .manager
                        .destroy(ctx, entry.resource)
                        .await
                        .map_err(PoolError::Destroy)?;
                }
                Step::Create(slot) => {
                    let resource = inner.manager.create(ctx).await.map_err(PoolError::Create)?;
                    slot.keep();
                    debug!("created resource");
                    inner.record_wait(waited);
                    return Ok(resource);
                }
                Step::Wait(parked, waiting) => {
                    trace!("waiting for a resource");
                    let woke = parked.wait(ctx).await;

                    let elapsed = {
                        let mut state = inner.state.write();
                        // A wake-up consumed by a caller that is giving up
                        // goes to the next waiter.
                        if woke.is_err() && (!state.free.is_empty() || state.active < inner.limit) {
                            inner.handoff.notify_one();
                        }
                        waiting.finish(&mut state)
                    };

                    // A wake-up may be stale; the wait only counts once
                    // the loop hands out a resource.
                    match woke {
                        Ok(WakeReason::Available) => {
                            *waited.get_or_insert(Duration::ZERO) += elapsed;
                        }
                        Ok(WakeReason::Closing) => return Err(inner.refuse(ctx, Refusal::Closed)),
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
    }

    /// Take a permit, waiting for one unless fast-fail is configured.
    /// Returns how long the caller blocked, if it had to.
    async fn admit(
        &self,
        admission: &AdmissionController,
        ctx: &Context,
    ) -> ManagerResult<Option<Duration>, M> {
        let inner = &*self.inner;

        let waiting = {
            let mut state = inner.state.write();
            if state.closed {
                Err(Refusal::Closed)
            } else {
                match admission.try_acquire_permit() {
                    Admission::Granted => return Ok(None),
                    Admission::Closed => Err(Refusal::Closed),
                    Admission::Unavailable if inner.config.fast_fail => Err(Refusal::Exhausted),
                    Admission::Unavailable => {
                        trace!(waiting = state.waiting + 1, "waiting for a permit");
                        Ok(Waiting::start(inner, &mut state))
                    }
                }
            }
        }
        .map_err(|refusal| inner.refuse(ctx, refusal))?;

        let acquired = admission.acquire_permit(ctx).await;
        let elapsed = waiting.finish(&mut inner.state.write());

        match acquired {
            Ok(Admission::Granted) => Ok(Some(elapsed)),
            Ok(_) => Err(inner.refuse(ctx, Refusal::Closed)),
            Err(err) => Err(err.into()),
        }
    }

    /// Hand back a resource obtained from [`Pool::take`].
    ///
    /// On a closed pool, or when nothing is checked out, the resource is
    /// destroyed instead and the destroy result is returned. Putting a
    /// resource this pool never handed out is a caller error.
    pub async fn put(&self, ctx: &Context, resource: M::Resource) -> ManagerResult<(), M> {
        let inner = &*self.inner;

        let rejected = {
            let mut state = inner.state.write();
            let idle = state.free.len();

            if state.closed || state.active <= idle {
                Some(resource)
            } else {
                if let Some(admission) = &inner.admission {
                    admission.release_permit();
                }
                state.free.push(IdleEntry::new(resource));
                inner.handoff.notify_one();
                trace!(active = state.active, idle = idle + 1, "resource returned");
                None
            }
        };

        match rejected {
            Some(resource) => {
                debug!("destroying returned resource");
                inner
                    .manager
                    .destroy(ctx, resource)
                    .await
                    .map_err(PoolError::Destroy)
            }
            None => Ok(()),
        }
    }

    /// Take a resource wrapped in a guard that returns it on drop
    pub async fn get(&self, ctx: &Context) -> ManagerResult<PooledResource<M>, M> {
        let resource = self.take(ctx).await?;
        Ok(PooledResource {
            pool: self.clone(),
            resource: Some(resource),
        })
    }

    /// Destroy idle resources that expired or fail the liveness check.
    ///
    /// Returns how many were removed. Every removed resource is destroyed;
    /// the first destroy error is returned.
    ///
    /// The liveness check runs on every idle resource while the pool lock
    /// is held, so `take`, `put` and `status` wait for the sweep. Keep the
    /// check cheap when sweeping large pools.
    pub async fn evict_idle(&self, ctx: &Context) -> ManagerResult<usize, M> {
        let inner = &*self.inner;
        let now = Instant::now();

        let evicted = {
            let mut state = inner.state.write();
            if state.closed {
                return Ok(0);
            }

            let config = &inner.config;
            let evicted = state.free.remove_where(|entry| {
                config.eviction_policy.is_expired(entry.idle_since, now)
                    || !config.is_alive(ctx, &entry.resource)
            });

            state.active = state.active.saturating_sub(evicted.len());
            for _ in 0..evicted.len() {
                inner.handoff.notify_one();
            }
            evicted
        };

        let count = evicted.len();
        if count > 0 {
            debug!(count, "evicting idle resources");
        }
        inner.destroy_all(ctx, evicted).await?;
        Ok(count)
    }

    /// Current counters, read under the shared lock
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.read();

        let average_wait_duration = if state.total_waited > 0 {
            let nanos = state.total_waited_duration.as_nanos() / u128::from(state.total_waited);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        } else {
            Duration::ZERO
        };

        PoolStatus {
            limit: self.inner.limit,
            active: state.active,
            idle: state.free.len(),
            waiting: state.waiting,
            average_wait_duration,
        }
    }

    /// Close the pool and destroy every idle resource.
    ///
    /// Closing twice is a no-op. Resources still checked out are destroyed
    /// when they are put back. Every idle resource gets one destroy call
    /// even if an earlier one fails; the first failure is returned.
    pub async fn close(&self, ctx: &Context) -> ManagerResult<(), M> {
        let inner = &*self.inner;

        let drained = {
            let mut state = inner.state.write();
            if state.closed {
                return Ok(());
            }

            let drained = state.free.drain();
            state.active = 0;
            state.waiting = 0;
            state.total_waited = 0;
            state.total_waited_duration = Duration::ZERO;
            state.closed = true;

            if let Some(admission) = &inner.admission {
                admission.close();
            }
            inner.handoff.close();
            drained
        };

        debug!(idle = drained.len(), "closing resource pool");
        inner.destroy_all(ctx, drained).await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.read().closed
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Forget a checked-out resource without returning it
    fn forget_checked_out(&self) {
        let mut state = self.inner.state.write();
        self.inner.release_slot(&mut state);
    }
}

/// A pooled resource that goes back to the pool when dropped.
///
/// Dropping the guard spawns the return on the current tokio runtime.
/// Use [`PooledResource::release`] to return it and observe the result.
pub struct PooledResource<M: ResourceManager> {
    pool: Pool<M>,
    resource: Option<M::Resource>,
}

impl<M: ResourceManager> PooledResource<M> {
    /// Return the resource to the pool now
    pub async fn release(mut self, ctx: &Context) -> ManagerResult<(), M> {
        let resource = self.resource.take().expect("Resource already taken");
        self.pool.put(ctx, resource).await
    }

    /// Take the resource out of the pool for good.
    ///
    /// Its slot is freed, so the pool may create a replacement.
    pub fn detach(mut self) -> M::Resource {
        let resource = self.resource.take().expect("Resource already taken");
        self.pool.forget_checked_out();
        resource
    }
}

impl<M: ResourceManager> Deref for PooledResource<M> {
    type Target = M::Resource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("Resource already taken")
    }
}

impl<M: ResourceManager> DerefMut for PooledResource<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("Resource already taken")
    }
}

impl<M> fmt::Debug for PooledResource<M>
where
    M: ResourceManager,
    M::Resource: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("resource", &self.resource)
            .finish()
    }
}

impl<M: ResourceManager> Drop for PooledResource<M> {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let pool = self.pool.clone();
                handle.spawn(async move {
                    if let Err(err) = pool.put(&Context::background(), resource).await {
                        warn!(error = %err, "failed to return dropped resource");
                    }
                });
            }
            Err(_) => {
                warn!("pooled resource dropped outside a tokio runtime; discarding it");
                self.pool.forget_checked_out();
                drop(resource);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(thiserror::Error, Debug)]
    #[error("test manager failure")]
    struct TestError;

    #[derive(Default)]
    struct Counters {
        next_id: AtomicUsize,
        destroyed: parking_lot::Mutex<Vec<usize>>,
        fail_create: AtomicBool,
    }

    struct TestManager {
        counters: Arc<Counters>,
        create_delay: Duration,
    }

    #[async_trait]
    impl ResourceManager for TestManager {
        type Resource = usize;
        type Error = TestError;

        async fn create(&self, _ctx: &Context) -> Result<usize, TestError> {
            if !self.create_delay.is_zero() {
                tokio::time::sleep(self.create_delay).await;
            }
            if self.counters.fail_create.load(Ordering::SeqCst) {
                return Err(TestError);
            }
            Ok(self.counters.next_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn destroy(&self, _ctx: &Context, resource: usize) -> Result<(), TestError> {
            self.counters.destroyed.lock().push(resource);
            Ok(())
        }
    }

    fn pool_with(
        limit: usize,
        config: PoolConfiguration<usize, TestError>,
    ) -> (Pool<TestManager>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let manager = TestManager {
            counters: Arc::clone(&counters),
            create_delay: Duration::ZERO,
        };
        (Pool::new(limit, manager, config), counters)
    }

    #[tokio::test]
    async fn test_take_creates_then_reuses() {
        let (pool, counters) = pool_with(2, PoolConfiguration::new());
        let ctx = Context::background();

        let first = pool.take(&ctx).await.unwrap();
        pool.put(&ctx, first).await.unwrap();
        let again = pool.take(&ctx).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(counters.next_id.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().using(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back() {
        let (pool, counters) = pool_with(1, PoolConfiguration::new().with_fast_fail());
        let ctx = Context::background();

        counters.fail_create.store(true, Ordering::SeqCst);
        assert!(matches!(pool.take(&ctx).await, Err(PoolError::Create(TestError))));
        assert_eq!(pool.status().active, 0);

        counters.fail_create.store(false, Ordering::SeqCst);
        assert_eq!(pool.take(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropped_take_releases_slot() {
        let counters = Arc::new(Counters::default());
        let manager = TestManager {
            counters: Arc::clone(&counters),
            create_delay: Duration::from_millis(200),
        };
        let pool = Pool::new(1, manager, PoolConfiguration::new().with_fast_fail());
        let ctx = Context::background();

        let abandoned = tokio::time::timeout(Duration::from_millis(20), pool.take(&ctx)).await;
        assert!(abandoned.is_err());
        assert_eq!(pool.status().active, 0);

        assert!(pool.take(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_liveness_failure_destroys_and_replaces() {
        let config = PoolConfiguration::new().with_liveness_check(|_, id: &usize| *id != 0);
        let (pool, counters) = pool_with(1, config);
        let ctx = Context::background();

        let first = pool.take(&ctx).await.unwrap();
        pool.put(&ctx, first).await.unwrap();

        let second = pool.take(&ctx).await.unwrap();
        assert_eq!(second, 1);
        assert_eq!(*counters.destroyed.lock(), vec![0]);
        assert_eq!(pool.status().active, 1);
    }

    #[tokio::test]
    async fn test_idle_timeout_expires_on_take() {
        let config = PoolConfiguration::new().with_idle_timeout(Duration::from_millis(10));
        let (pool, counters) = pool_with(1, config);
        let ctx = Context::background();

        let first = pool.take(&ctx).await.unwrap();
        pool.put(&ctx, first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(pool.take(&ctx).await.unwrap(), 1);
        assert_eq!(*counters.destroyed.lock(), vec![0]);
    }

    #[tokio::test]
    async fn test_evict_idle_sweeps_free_list() {
        let config = PoolConfiguration::new().with_liveness_check(|_, id: &usize| id % 2 == 1);
        let (pool, counters) = pool_with(4, config);
        let ctx = Context::background();

        // Freshly created resources are not liveness checked.
        let taken: Vec<_> = [
            pool.take(&ctx).await.unwrap(),
            pool.take(&ctx).await.unwrap(),
            pool.take(&ctx).await.unwrap(),
        ]
        .into();
        for id in taken {
            pool.put(&ctx, id).await.unwrap();
        }

        assert_eq!(pool.evict_idle(&ctx).await.unwrap(), 2);
        assert_eq!(*counters.destroyed.lock(), vec![0, 2]);

        let status = pool.status();
        assert_eq!(status.active, 1);
        assert_eq!(status.idle, 1);
    }

    #[tokio::test]
    async fn test_put_with_nothing_checked_out_is_destroyed() {
        let (pool, counters) = pool_with(1, PoolConfiguration::new());
        let ctx = Context::background();

        pool.put(&ctx, 42).await.unwrap();
        assert_eq!(*counters.destroyed.lock(), vec![42]);
        assert_eq!(pool.status().active, 0);
        assert_eq!(pool.status().idle, 0);

        assert_eq!(pool.take(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stray_put_cannot_raise_capacity() {
        let (pool, counters) = pool_with(2, PoolConfiguration::new().with_fast_fail());
        let ctx = Context::background();

        let first = pool.take(&ctx).await.unwrap();
        pool.put(&ctx, first).await.unwrap();
        pool.put(&ctx, 99).await.unwrap();
        assert_eq!(*counters.destroyed.lock(), vec![99]);

        let a = pool.take(&ctx).await.unwrap();
        let b = pool.take(&ctx).await.unwrap();
        assert_eq!((a, b), (0, 1));
        assert!(pool.take(&ctx).await.unwrap_err().is_exhausted());

        let status = pool.status();
        assert_eq!(status.active, 2);
        assert_eq!(status.idle, 0);
        assert_eq!(counters.next_id.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pooled_resource_returns_on_drop() {
        let (pool, _) = pool_with(1, PoolConfiguration::new());
        let ctx = Context::background();

        {
            let resource = pool.get(&ctx).await.unwrap();
            assert_eq!(*resource, 0);
        }

        let resource = tokio::time::timeout(Duration::from_secs(1), pool.get(&ctx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*resource, 0);
        resource.release(&ctx).await.unwrap();
        assert_eq!(pool.status().idle, 1);
    }

    #[tokio::test]
    async fn test_detach_frees_slot() {
        let (pool, _) = pool_with(1, PoolConfiguration::new().with_fast_fail());
        let ctx = Context::background();

        let detached = pool.get(&ctx).await.unwrap().detach();
        assert_eq!(detached, 0);
        assert_eq!(pool.status().active, 0);

        assert_eq!(pool.take(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_without_admission_control_hands_off() {
        let (pool, _) = pool_with(1, PoolConfiguration::new().without_admission_control());
        let ctx = Context::background();

        let held = pool.take(&ctx).await.unwrap();

        let waiter = pool.clone();
        let handle = tokio::spawn(async move { waiter.take(&Context::background()).await });
        for _ in 0..100 {
            if pool.status().waiting == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(pool.status().waiting, 1);

        pool.put(&ctx, held).await.unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), held);

        let status = pool.status();
        assert_eq!(status.waiting, 0);
        assert_eq!(status.active, 1);
        assert!(status.average_wait_duration > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_without_admission_control_fast_fail() {
        let config = PoolConfiguration::new()
            .without_admission_control()
            .with_fast_fail();
        let (pool, _) = pool_with(1, config);
        let ctx = Context::background();

        let _held = pool.take(&ctx).await.unwrap();
        assert!(pool.take(&ctx).await.unwrap_err().is_exhausted());
    }

    #[tokio::test]
    async fn test_waiter_replaces_dead_resource() {
        let config = PoolConfiguration::new()
            .without_admission_control()
            .with_liveness_check(|_, _: &usize| false);
        let (pool, _) = pool_with(1, config);
        let ctx = Context::background();

        let held = pool.take(&ctx).await.unwrap();
        let waiter = pool.clone();
        let handle = tokio::spawn(async move { waiter.take(&Context::background()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The returned resource fails liveness; the waiter must still get one.
        pool.put(&ctx, held).await.unwrap();
        let got = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(got, 1);
    }

    async fn abandon_blocked_take(config: PoolConfiguration<usize, TestError>) {
        let (pool, _) = pool_with(1, config);
        let ctx = Context::background();

        let held = pool.take(&ctx).await.unwrap();
        let abandoned = tokio::time::timeout(Duration::from_millis(30), pool.take(&ctx)).await;
        assert!(abandoned.is_err());
        assert_eq!(pool.status().waiting, 0);

        pool.put(&ctx, held).await.unwrap();
        let again = pool.take(&ctx).await.unwrap();
        assert_eq!(again, held);
        pool.put(&ctx, again).await.unwrap();

        let status = pool.status();
        assert_eq!(status.waiting, 0);
        assert_eq!(status.idle, 1);
        assert_eq!(status.average_wait_duration, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_dropped_blocked_take_uncounts_waiter() {
        abandon_blocked_take(PoolConfiguration::new()).await;
    }

    #[tokio::test]
    async fn test_dropped_blocked_take_uncounts_waiter_without_admission_control() {
        abandon_blocked_take(PoolConfiguration::new().without_admission_control()).await;
    }

    #[tokio::test]
    async fn test_stale_wake_up_is_not_a_wait() {
        let (pool, _) = pool_with(1, PoolConfiguration::new().without_admission_control());
        let ctx = Context::background();

        // The put finds nobody parked, so its wake-up is left pending.
        let first = pool.take(&ctx).await.unwrap();
        pool.put(&ctx, first).await.unwrap();
        let _held = pool.take(&ctx).await.unwrap();

        let short = Context::with_timeout(Duration::from_millis(50));
        assert_eq!(
            pool.take(&short).await.unwrap_err().context_error(),
            Some(ContextError::DeadlineExceeded)
        );

        let status = pool.status();
        assert_eq!(status.waiting, 0);
        assert_eq!(status.average_wait_duration, Duration::ZERO);
    }
}

//! Resource lifecycle callbacks

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::context::Context;

/// Creates and destroys the resources a [`Pool`](crate::Pool) hands out.
///
/// Both methods may block for as long as they like (dialing a socket,
/// closing a connection); the pool never holds its lock while calling them.
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    type Resource: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Make a new resource
    async fn create(&self, ctx: &Context) -> Result<Self::Resource, Self::Error>;

    /// Tear a resource down for good
    async fn destroy(&self, ctx: &Context, resource: Self::Resource) -> Result<(), Self::Error>;
}

/// [`ResourceManager`] built from two async closures.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{Context, FnManager, Pool, PoolConfiguration};
/// use std::convert::Infallible;
///
/// # #[tokio::main]
/// # async fn main() {
/// let manager = FnManager::new(
///     |_ctx: Context| async { Ok::<_, Infallible>(String::from("conn")) },
///     |_ctx: Context, _conn: String| async { Ok::<_, Infallible>(()) },
/// );
///
/// let pool = Pool::new(4, manager, PoolConfiguration::new());
/// let ctx = Context::background();
/// let conn = pool.take(&ctx).await.unwrap();
/// assert_eq!(conn, "conn");
/// pool.put(&ctx, conn).await.unwrap();
/// # }
/// ```
pub struct FnManager<R, E, C, D> {
    create: C,
    destroy: D,
    _marker: PhantomData<fn() -> (R, E)>,
}

impl<R, E, C, D> FnManager<R, E, C, D> {
    pub fn new(create: C, destroy: D) -> Self {
        Self {
            create,
            destroy,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, E, C, CF, D, DF> ResourceManager for FnManager<R, E, C, D>
where
    R: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
    C: Fn(Context) -> CF + Send + Sync + 'static,
    CF: Future<Output = Result<R, E>> + Send + 'static,
    D: Fn(Context, R) -> DF + Send + Sync + 'static,
    DF: Future<Output = Result<(), E>> + Send + 'static,
{
    type Resource = R;
    type Error = E;

    async fn create(&self, ctx: &Context) -> Result<R, E> {
        (self.create)(ctx.clone()).await
    }

    async fn destroy(&self, ctx: &Context, resource: R) -> Result<(), E> {
        (self.destroy)(ctx.clone(), resource).await
    }
}

//! # EsoxSolutions.ResourcePool
//!
//! Bounded, async pool of reusable resources for Rust: database connections,
//! HTTP clients, sockets, or anything else that is expensive to create.
//!
//! ## Features
//!
//! - Hard upper bound on live resources, enforced by permit-based admission
//! - Blocking or fast-fail behavior when the pool is exhausted
//! - Cancellation and deadlines through an operation [`Context`]
//! - Optional liveness check and idle timeout for reused resources
//! - Idempotent, race-free shutdown that destroys every idle resource once
//! - Status snapshots with average wait time
//! - Prometheus metrics export
//! - RAII guard that returns resources on drop
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::{Context, FnManager, Pool, PoolConfiguration};
//! use std::io;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), esox_resourcepool::PoolError<io::Error>> {
//! let manager = FnManager::new(
//!     |_ctx: Context| async { Ok::<_, io::Error>(vec![0u8; 1024]) },
//!     |_ctx: Context, _buf: Vec<u8>| async { Ok::<_, io::Error>(()) },
//! );
//! let pool = Pool::new(8, manager, PoolConfiguration::new());
//! let ctx = Context::background();
//!
//! let buf = pool.take(&ctx).await?;
//! assert_eq!(buf.len(), 1024);
//! pool.put(&ctx, buf).await?;
//!
//! assert_eq!(pool.status().idle, 1);
//! pool.close(&ctx).await?;
//! # Ok(())
//! # }
//! ```

mod admission;
mod config;
mod context;
mod errors;
mod eviction;
mod free_list;
mod handoff;
mod manager;
#[cfg(feature = "metrics")]
mod metrics;
mod pool;
mod status;

pub use config::{ErrorFactory, LivenessCheck, PoolConfiguration};
pub use context::{Context, ContextError};
pub use errors::{PoolError, PoolResult};
pub use eviction::EvictionPolicy;
pub use free_list::FreeList;
pub use manager::{FnManager, ResourceManager};
#[cfg(feature = "metrics")]
pub use metrics::StatusExporter;
pub use pool::{Pool, PooledResource};
pub use status::PoolStatus;

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

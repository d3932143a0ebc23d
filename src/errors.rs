//! Error types for the resource pool

use thiserror::Error;

use crate::context::ContextError;

/// Errors returned by pool operations.
///
/// `E` is the error type of the [`ResourceManager`](crate::ResourceManager)
/// callbacks. Callback errors are carried unchanged in `Create` / `Destroy`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError<E> {
    #[error("pool is closed")]
    Closed,

    #[error("pool is exhausted - all resources are in use")]
    Exhausted,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to create resource: {0}")]
    Create(#[source] E),

    #[error("failed to destroy resource: {0}")]
    Destroy(#[source] E),

    /// Produced by a caller-supplied error factory
    #[error("{0}")]
    Custom(E),
}

impl<E> PoolError<E> {
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::Closed)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, PoolError::Exhausted)
    }

    /// The context error if this error came from cancellation or a deadline
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            PoolError::Context(err) => Some(*err),
            _ => None,
        }
    }
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;

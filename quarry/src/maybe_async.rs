//! A value that is either available now or still being computed.
//!
//! Stores, pipes and loaders return [`MaybeAsync`] so synchronous
//! implementations resolve immediately while asynchronous ones hand back a
//! future. Hosts that cannot await (synchronous module resolution paths) call
//! [`MaybeAsync::now`] and report an error when the value is still pending.

use futures::future::BoxFuture;
use std::fmt;
use std::future::{Future, IntoFuture};

pub enum MaybeAsync<'a, T> {
    Ready(T),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T: Send + 'a> MaybeAsync<'a, T> {
    /// Wrap a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'a,
    {
        MaybeAsync::Pending(Box::pin(future))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, MaybeAsync::Ready(_))
    }

    /// Take the value if it is already available, otherwise give the pending
    /// value back to the caller.
    pub fn now(self) -> Result<T, Self> {
        match self {
            MaybeAsync::Ready(value) => Ok(value),
            pending => Err(pending),
        }
    }

    /// Await the value, whichever variant holds it.
    pub async fn resolve(self) -> T {
        match self {
            MaybeAsync::Ready(value) => value,
            MaybeAsync::Pending(future) => future.await,
        }
    }

    /// Transform the eventual value without forcing an await.
    pub fn map<U, F>(self, f: F) -> MaybeAsync<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        match self {
            MaybeAsync::Ready(value) => MaybeAsync::Ready(f(value)),
            MaybeAsync::Pending(future) => MaybeAsync::pending(async move { f(future.await) }),
        }
    }
}

impl<'a, T: Send + 'a> IntoFuture for MaybeAsync<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            MaybeAsync::Ready(value) => Box::pin(futures::future::ready(value)),
            MaybeAsync::Pending(future) => future,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MaybeAsync<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeAsync::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            MaybeAsync::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

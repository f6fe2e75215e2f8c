//! Ordered callback chains that plugins contribute to.
//!
//! A [`Hook`] runs callbacks over a shared context; a [`Pipe`] threads one
//! value through a chain of transformations. Steps are either synchronous or
//! asynchronous. A run stays synchronous (and returns [`MaybeAsync::Ready`])
//! until the first asynchronous step, so chains made only of synchronous
//! steps can serve hosts that cannot await.
//!
//! Registration closes once a chain has been run. Adding a step afterwards
//! panics.

use crate::error::Result;
use crate::maybe_async::MaybeAsync;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

type SyncHook<C> = Box<dyn Fn(&C) -> Result<()> + Send + Sync>;
type AsyncHook<C> = Box<dyn for<'c> Fn(&'c C) -> BoxFuture<'c, Result<()>> + Send + Sync>;

enum HookStep<C> {
    Sync(SyncHook<C>),
    Async(AsyncHook<C>),
}

pub struct Hook<C> {
    steps: Vec<HookStep<C>>,
    frozen: AtomicBool,
}

impl<C: Sync + 'static> Hook<C> {
    pub fn new() -> Self {
        Hook {
            steps: Vec::new(),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn hook<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&C) -> Result<()> + Send + Sync + 'static,
    {
        self.assert_open();
        self.steps.push(HookStep::Sync(Box::new(f)));
        self
    }

    pub fn hook_async<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'c> Fn(&'c C) -> BoxFuture<'c, Result<()>> + Send + Sync + 'static,
    {
        self.assert_open();
        self.steps.push(HookStep::Async(Box::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Run every step in registration order. A step starts only after the
    /// previous one finished; the first error stops the run.
    pub fn run_sequential<'a>(&'a self, ctx: &'a C) -> MaybeAsync<'a, Result<()>> {
        self.frozen.store(true, Ordering::Release);
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                HookStep::Sync(f) => {
                    if let Err(e) = f(ctx) {
                        return MaybeAsync::Ready(Err(e));
                    }
                }
                HookStep::Async(_) => {
                    let rest = &self.steps[i..];
                    return MaybeAsync::pending(async move {
                        for step in rest {
                            match step {
                                HookStep::Sync(f) => f(ctx)?,
                                HookStep::Async(f) => f(ctx).await?,
                            }
                        }
                        Ok(())
                    });
                }
            }
        }
        MaybeAsync::Ready(Ok(()))
    }

    /// Run synchronous steps inline and asynchronous steps concurrently.
    /// Completes once every started step has finished, reporting the first
    /// error in registration order.
    pub fn run_concurrent<'a>(&'a self, ctx: &'a C) -> MaybeAsync<'a, Result<()>> {
        self.frozen.store(true, Ordering::Release);
        let mut pending = Vec::new();
        for step in &self.steps {
            match step {
                HookStep::Sync(f) => {
                    if let Err(e) = f(ctx) {
                        return MaybeAsync::Ready(Err(e));
                    }
                }
                HookStep::Async(f) => pending.push(f(ctx)),
            }
        }
        if pending.is_empty() {
            return MaybeAsync::Ready(Ok(()));
        }
        MaybeAsync::pending(async move {
            futures::future::join_all(pending)
                .await
                .into_iter()
                .collect::<Result<Vec<()>>>()
                .map(|_| ())
        })
    }

    fn assert_open(&self) {
        assert!(
            !self.is_frozen(),
            "hook step registered after the hook started running"
        );
    }
}

impl<C: Sync + 'static> Default for Hook<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Hook<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("steps", &self.steps.len())
            .field("frozen", &self.frozen.load(Ordering::Relaxed))
            .finish()
    }
}

type SyncPipe<D, C> = Box<dyn Fn(D, &C) -> Result<D> + Send + Sync>;
type AsyncPipe<D, C> = Box<dyn for<'c> Fn(D, &'c C) -> BoxFuture<'c, Result<D>> + Send + Sync>;

enum PipeStep<D, C> {
    Sync(SyncPipe<D, C>),
    Async(AsyncPipe<D, C>),
}

pub struct Pipe<D, C> {
    steps: Vec<PipeStep<D, C>>,
    frozen: AtomicBool,
}

impl<D, C> Pipe<D, C>
where
    D: Send + 'static,
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Pipe {
            steps: Vec::new(),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn pipe<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(D, &C) -> Result<D> + Send + Sync + 'static,
    {
        self.assert_open();
        self.steps.push(PipeStep::Sync(Box::new(f)));
        self
    }

    pub fn pipe_async<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'c> Fn(D, &'c C) -> BoxFuture<'c, Result<D>> + Send + Sync + 'static,
    {
        self.assert_open();
        self.steps.push(PipeStep::Async(Box::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Thread `data` through every step in registration order.
    pub fn run<'a>(&'a self, mut data: D, ctx: C) -> MaybeAsync<'a, Result<D>> {
        self.frozen.store(true, Ordering::Release);
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PipeStep::Sync(f) => match f(data, &ctx) {
                    Ok(next) => data = next,
                    Err(e) => return MaybeAsync::Ready(Err(e)),
                },
                PipeStep::Async(_) => {
                    let rest = &self.steps[i..];
                    return MaybeAsync::pending(async move {
                        let mut data = data;
                        for step in rest {
                            data = match step {
                                PipeStep::Sync(f) => f(data, &ctx)?,
                                PipeStep::Async(f) => f(data, &ctx).await?,
                            };
                        }
                        Ok(data)
                    });
                }
            }
        }
        MaybeAsync::Ready(Ok(data))
    }

    fn assert_open(&self) {
        assert!(
            !self.is_frozen(),
            "pipe step registered after the pipe started running"
        );
    }
}

impl<D, C> Default for Pipe<D, C>
where
    D: Send + 'static,
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D, C> fmt::Debug for Pipe<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("steps", &self.steps.len())
            .field("frozen", &self.frozen.load(Ordering::Relaxed))
            .finish()
    }
}

//! Pipeline behaviors and chain composition
//!
//! A [`Behavior`] is one stage of the dispatch pipeline: it receives the
//! request and a [`Next`] continuation representing the rest of the chain. It
//! may reject the request without calling `next`, and may transform the
//! response on the way back out.
//!
//! Chains are composed once, when the mediator is built: the ordered stage
//! list is folded right-to-left into a single callable, with the first
//! registered behavior outermost and the handler terminal. Dispatch then runs
//! the pre-composed callable with no recursive stage lookup per call.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::dispatch::DispatchError;
use super::handler::{Handler, Request};

/// Result of one pipeline stage
pub type DispatchResult<T> = Result<T, DispatchError>;

type StageFuture<T> = BoxFuture<'static, DispatchResult<T>>;

type Stage<R> = Arc<
    dyn Fn(R, CancellationToken) -> StageFuture<<R as Request>::Response> + Send + Sync,
>;

/// Continuation representing the remainder of the chain, ending in the
/// handler.
///
/// A behavior that lets the request through calls [`Next::run`] exactly once.
pub struct Next<R: Request> {
    stage: Stage<R>,
}

impl<R: Request> Next<R> {
    /// Invoke the rest of the chain.
    pub async fn run(self, request: R, cancel: CancellationToken) -> DispatchResult<R::Response> {
        (self.stage)(request, cancel).await
    }
}

/// One cross-cutting stage of the dispatch pipeline.
///
/// Ordering between behaviors is significant and fixed at registration time.
/// A behavior that observes a triggered cancellation token must stop promptly
/// and must not invoke `next`.
#[async_trait]
pub trait Behavior<R: Request>: Send + Sync + 'static {
    /// Run this stage, invoking `next` at most once.
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response>;
}

/// A fully composed chain for one request type.
pub(crate) struct Pipeline<R: Request> {
    stage: Stage<R>,
}

impl<R: Request> Pipeline<R> {
    /// Fold the stage list into one callable: handler terminal, behaviors
    /// wrapped around it right-to-left so the first behavior runs outermost.
    pub(crate) fn assemble(
        handler: Arc<dyn Handler<R>>,
        behaviors: Vec<Arc<dyn Behavior<R>>>,
    ) -> Self {
        let mut stage: Stage<R> = Arc::new(move |request, cancel| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                if cancel.is_cancelled() {
                    return Err(DispatchError::Cancelled);
                }
                Ok(handler.handle(request, &cancel).await)
            })
        });

        for behavior in behaviors.into_iter().rev() {
            let inner = stage;
            stage = Arc::new(move |request, cancel| {
                let behavior = Arc::clone(&behavior);
                let next = Next {
                    stage: Arc::clone(&inner),
                };
                Box::pin(async move { behavior.handle(request, next, cancel).await })
            });
        }

        Self { stage }
    }

    pub(crate) async fn run(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        (self.stage)(request, cancel).await
    }
}

//! Request validation as a pipeline stage
//!
//! [`ValidationBehavior`] sits outermost on every route. It runs all
//! validators registered for the request type, collects every failure from
//! every validator (not just the first), and aborts the chain with
//! [`DispatchError::Validation`] when the combined list is non-empty. The
//! handler never sees a rejected request.
//!
//! A rejected request is a normal outcome, not a system fault, and is logged
//! at `debug` level only.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::envelope::ValidationFailure;
use crate::mediator::behavior::{Behavior, DispatchResult, Next};
use crate::mediator::dispatch::DispatchError;
use crate::mediator::handler::Request;

/// Validates one request type.
///
/// A validator returns every failure it finds; collection across validators
/// and chain abortion are the behavior's job.
pub trait Validator<R>: Send + Sync + 'static {
    /// Inspect the request, returning zero or more failures.
    fn validate(&self, request: &R) -> Vec<ValidationFailure>;
}

/// Plain functions and closures act as validators.
impl<R, F> Validator<R> for F
where
    F: Fn(&R) -> Vec<ValidationFailure> + Send + Sync + 'static,
{
    fn validate(&self, request: &R) -> Vec<ValidationFailure> {
        self(request)
    }
}

/// Pipeline stage running the validators registered for `R`.
///
/// With zero validators the stage is a no-op passthrough.
pub struct ValidationBehavior<R> {
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R> ValidationBehavior<R> {
    /// Wrap the validators registered for `R`, in registration order.
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self { validators }
    }
}

#[async_trait]
impl<R: Request> Behavior<R> for ValidationBehavior<R> {
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        // Every validator runs; failures keep validator-registration order.
        // Entries with an empty message are discarded defensively.
        let failures: Vec<ValidationFailure> = self
            .validators
            .iter()
            .flat_map(|validator| validator.validate(&request))
            .filter(|failure| !failure.message.is_empty())
            .collect();

        if !failures.is_empty() {
            tracing::debug!(
                request = std::any::type_name::<R>(),
                failures = failures.len(),
                "request rejected by validation"
            );
            return Err(DispatchError::Validation(failures));
        }

        next.run(request, cancel).await
    }
}

//! Mediator registration and dispatch
//!
//! [`MediatorBuilder`] assembles the immutable route table at startup: one
//! handler per request type, plus the ordered behaviors and validators for
//! that type. Wiring mistakes (duplicate handler, behavior without a handler)
//! surface when [`MediatorBuilder::build`] is called, not at request time.
//!
//! [`Mediator::send`] resolves the pre-composed pipeline by the request's
//! `TypeId` and runs it. The route table is read-only after build and shared
//! freely across concurrent dispatches.

use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::envelope::{Envelope, ValidationFailure};
use crate::ids::DispatchId;
use crate::validation::{ValidationBehavior, Validator};

use super::behavior::{Behavior, DispatchResult, Pipeline};
use super::handler::{Handler, Request};

/// Faults raised by the dispatch pipeline itself.
///
/// `HandlerNotFound` and `DuplicateHandler` are wiring bugs: fatal and not
/// retryable. `Validation` is a normal rejected-input outcome and is the only
/// variant the envelope layer translates rather than propagates.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    /// No handler is registered for the request's runtime type
    #[error("no handler registered for request type `{0}`")]
    HandlerNotFound(&'static str),

    /// A second handler was registered for the same request type
    #[error("handler already registered for request type `{0}`")]
    DuplicateHandler(&'static str),

    /// The request was rejected by validation; the handler never ran
    #[error("request validation failed with {} failure(s)", .0.len())]
    Validation(Vec<ValidationFailure>),

    /// The cancellation token was triggered before the stage could proceed
    #[error("dispatch cancelled")]
    Cancelled,
}

/// Per-request-type wiring collected by the builder before composition.
struct RouteBuilder<R: Request> {
    handler: Arc<dyn Handler<R>>,
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    validators: Vec<Arc<dyn Validator<R>>>,
}

/// Object-safe view of a [`RouteBuilder`] so routes for different request
/// types can share one table.
trait AnyRoute: Send + Sync {
    fn as_any_mut(&mut self) -> &mut (dyn Any + Send + Sync);
    fn seal(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<R: Request> AnyRoute for RouteBuilder<R> {
    fn as_any_mut(&mut self) -> &mut (dyn Any + Send + Sync) {
        self
    }

    fn seal(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        let route = *self;
        // Validation always sits outermost; with zero validators it is a
        // structural no-op passthrough.
        let mut chain: Vec<Arc<dyn Behavior<R>>> = Vec::with_capacity(route.behaviors.len() + 1);
        chain.push(Arc::new(ValidationBehavior::new(route.validators)));
        chain.extend(route.behaviors);
        Box::new(Pipeline::assemble(route.handler, chain))
    }
}

/// Builder for the immutable dispatch table.
///
/// Handlers must be registered before behaviors or validators for the same
/// request type.
#[derive(Default)]
pub struct MediatorBuilder {
    routes: HashMap<TypeId, Box<dyn AnyRoute>>,
    wiring_errors: Vec<DispatchError>,
}

impl MediatorBuilder {
    /// Register the single handler for `R`.
    ///
    /// Registering a second handler for the same request type is a wiring
    /// fault reported by [`MediatorBuilder::build`].
    pub fn register<R: Request>(mut self, handler: impl Handler<R>) -> Self {
        match self.routes.entry(TypeId::of::<R>()) {
            Entry::Occupied(_) => {
                self.wiring_errors
                    .push(DispatchError::DuplicateHandler(type_name::<R>()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Box::new(RouteBuilder::<R> {
                    handler: Arc::new(handler),
                    behaviors: Vec::new(),
                    validators: Vec::new(),
                }));
            }
        }
        self
    }

    /// Append a behavior to `R`'s chain.
    ///
    /// Behaviors run in registration order, first registered outermost, after
    /// the always-present validation stage.
    pub fn behavior<R: Request>(mut self, behavior: impl Behavior<R>) -> Self {
        let registered = match self.route_mut::<R>() {
            Some(route) => {
                route.behaviors.push(Arc::new(behavior));
                true
            }
            None => false,
        };
        if !registered {
            self.wiring_errors
                .push(DispatchError::HandlerNotFound(type_name::<R>()));
        }
        self
    }

    /// Register a validator for `R`, run by the validation stage in
    /// registration order.
    pub fn validator<R: Request>(mut self, validator: impl Validator<R>) -> Self {
        let registered = match self.route_mut::<R>() {
            Some(route) => {
                route.validators.push(Arc::new(validator));
                true
            }
            None => false,
        };
        if !registered {
            self.wiring_errors
                .push(DispatchError::HandlerNotFound(type_name::<R>()));
        }
        self
    }

    /// Compose every route and freeze the table.
    ///
    /// Fails fast with the first wiring fault recorded during registration.
    pub fn build(mut self) -> Result<Mediator, DispatchError> {
        if !self.wiring_errors.is_empty() {
            return Err(self.wiring_errors.remove(0));
        }
        let routes = self
            .routes
            .into_iter()
            .map(|(type_id, route)| (type_id, route.seal()))
            .collect();
        Ok(Mediator { routes })
    }

    fn route_mut<R: Request>(&mut self) -> Option<&mut RouteBuilder<R>> {
        self.routes
            .get_mut(&TypeId::of::<R>())
            .and_then(|route| route.as_any_mut().downcast_mut::<RouteBuilder<R>>())
    }
}

/// Dispatches requests through their composed pipelines.
///
/// Cheap to share: the route table is immutable after [`MediatorBuilder::build`]
/// and every pipeline stage is behind an `Arc`.
pub struct Mediator {
    routes: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Mediator {
    /// Start building a mediator.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Dispatch `request` through its pipeline.
    ///
    /// Returns the handler's response unmodified by the dispatcher itself;
    /// behaviors may have transformed it on the way out. A missing route is a
    /// [`DispatchError::HandlerNotFound`] fault.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let pipeline = self
            .routes
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.downcast_ref::<Pipeline<R>>())
            .ok_or_else(|| DispatchError::HandlerNotFound(type_name::<R>()))?;

        let dispatch_id = DispatchId::new();
        tracing::debug!(
            dispatch_id = %dispatch_id,
            request = type_name::<R>(),
            "dispatching request"
        );
        let outcome = pipeline.run(request, cancel).await;
        if let Err(error) = &outcome {
            match error {
                // Rejected input is a normal outcome, not a fault.
                DispatchError::Validation(failures) => tracing::debug!(
                    dispatch_id = %dispatch_id,
                    failures = failures.len(),
                    "request rejected by validation"
                ),
                other => tracing::warn!(dispatch_id = %dispatch_id, error = %other, "dispatch fault"),
            }
        }
        outcome
    }

    /// Dispatch a request whose response is an [`Envelope`], folding
    /// validation rejection into the envelope.
    ///
    /// Wiring faults and cancellation still propagate as errors; only
    /// [`DispatchError::Validation`] becomes
    /// [`Envelope::validation_error`].
    pub async fn send_enveloped<R, T>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<Envelope<T>>
    where
        R: Request<Response = Envelope<T>>,
        T: Send + 'static,
    {
        match self.send(request, cancel).await {
            Err(DispatchError::Validation(failures)) => Ok(Envelope::validation_error(failures)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::UnitResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CreateWidget {
        name: String,
    }

    impl Request for CreateWidget {
        type Response = Envelope<u64>;
    }

    struct CreateWidgetHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler<CreateWidget> for CreateWidgetHandler {
        async fn handle(&self, _request: CreateWidget, _cancel: &CancellationToken) -> Envelope<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Envelope::success(7)
        }
    }

    fn reject_empty_name(request: &CreateWidget) -> Vec<ValidationFailure> {
        if request.name.is_empty() {
            vec![ValidationFailure::new("name", "must not be empty")]
        } else {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_send_runs_single_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .build()
            .expect("wiring is valid");

        let outcome = mediator
            .send(
                CreateWidget {
                    name: "gear".into(),
                },
                CancellationToken::new(),
            )
            .await
            .expect("dispatch succeeds");

        assert!(outcome.successful());
        assert_eq!(outcome.data(), Some(&7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_validators_matches_direct_handler_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = CreateWidgetHandler {
            calls: Arc::clone(&calls),
        };
        let direct = handler
            .handle(
                CreateWidget {
                    name: "gear".into(),
                },
                &CancellationToken::new(),
            )
            .await;

        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .build()
            .expect("wiring is valid");
        let dispatched = mediator
            .send(
                CreateWidget {
                    name: "gear".into(),
                },
                CancellationToken::new(),
            )
            .await
            .expect("dispatch succeeds");

        assert_eq!(direct, dispatched);
    }

    #[tokio::test]
    async fn test_validation_rejection_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .validator::<CreateWidget>(reject_empty_name)
            .build()
            .expect("wiring is valid");

        let outcome = mediator
            .send(
                CreateWidget {
                    name: String::new(),
                },
                CancellationToken::new(),
            )
            .await;

        assert_eq!(
            outcome,
            Err(DispatchError::Validation(vec![ValidationFailure::new(
                "name",
                "must not be empty"
            )]))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_send_enveloped_surfaces_validation_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .validator::<CreateWidget>(reject_empty_name)
            .build()
            .expect("wiring is valid");

        let envelope = mediator
            .send_enveloped(
                CreateWidget {
                    name: String::new(),
                },
                CancellationToken::new(),
            )
            .await
            .expect("validation rejection is not a fault");

        assert!(!envelope.successful());
        assert!(envelope.errors().is_empty());
        assert_eq!(
            envelope.validation_failures(),
            &[ValidationFailure::new("name", "must not be empty")]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_union_in_validator_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .validator::<CreateWidget>(|_request: &CreateWidget| {
                vec![ValidationFailure::new("name", "first")]
            })
            .validator::<CreateWidget>(|_request: &CreateWidget| {
                vec![
                    ValidationFailure::new("name", "second"),
                    ValidationFailure::new("size", "third"),
                ]
            })
            .build()
            .expect("wiring is valid");

        let outcome = mediator
            .send(
                CreateWidget {
                    name: "gear".into(),
                },
                CancellationToken::new(),
            )
            .await;

        let Err(DispatchError::Validation(failures)) = outcome else {
            panic!("expected validation rejection");
        };
        let messages: Vec<&str> = failures.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_handler_is_a_wiring_fault() {
        struct Unregistered;
        impl Request for Unregistered {
            type Response = UnitResult;
        }

        let mediator = Mediator::builder().build().expect("empty wiring is valid");
        let outcome = mediator.send(Unregistered, CancellationToken::new()).await;
        assert!(matches!(outcome, Err(DispatchError::HandlerNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_handler_fails_at_build() {
        let built = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .build();

        assert!(matches!(built, Err(DispatchError::DuplicateHandler(_))));
    }

    #[tokio::test]
    async fn test_validator_without_handler_fails_at_build() {
        let built = Mediator::builder()
            .validator::<CreateWidget>(reject_empty_name)
            .build();

        assert!(matches!(built, Err(DispatchError::HandlerNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder()
            .register::<CreateWidget>(CreateWidgetHandler {
                calls: Arc::clone(&calls),
            })
            .build()
            .expect("wiring is valid");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = mediator
            .send(
                CreateWidget {
                    name: "gear".into(),
                },
                cancel,
            )
            .await;

        assert_eq!(outcome, Err(DispatchError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sends_share_one_mediator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mediator = Arc::new(
            Mediator::builder()
                .register::<CreateWidget>(CreateWidgetHandler {
                    calls: Arc::clone(&calls),
                })
                .build()
                .expect("wiring is valid"),
        );

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let mediator = Arc::clone(&mediator);
                tokio::spawn(async move {
                    mediator
                        .send(
                            CreateWidget {
                                name: format!("widget-{i}"),
                            },
                            CancellationToken::new(),
                        )
                        .await
                })
            })
            .collect();

        for task in tasks {
            let outcome = task.await.expect("task completes").expect("dispatch succeeds");
            assert!(outcome.successful());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }
}

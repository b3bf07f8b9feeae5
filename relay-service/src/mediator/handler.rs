//! Request and handler traits
//!
//! A request is an opaque value describing one intended operation (command or
//! query); its [`Request::Response`] type is fixed at the type level. Exactly
//! one [`Handler`] is registered per request type at wiring time.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// An intended operation, dispatched through the mediator.
///
/// The associated `Response` is whatever the handler returns, typically an
/// [`Envelope`](crate::envelope::Envelope).
pub trait Request: Send + 'static {
    /// Outcome type produced by this request's handler
    type Response: Send + 'static;
}

/// Maps one [`Request`] type to one response.
///
/// Handlers are stateless with respect to the pipeline: they may hold
/// injected dependencies but must not retain per-call state across
/// invocations, since a single handler instance serves concurrent dispatches.
///
/// # Example
///
/// ```rust,ignore
/// struct GetWidget { id: u64 }
///
/// impl Request for GetWidget {
///     type Response = Envelope<Widget>;
/// }
///
/// #[async_trait]
/// impl Handler<GetWidget> for GetWidgetHandler {
///     async fn handle(&self, request: GetWidget, _cancel: &CancellationToken) -> Envelope<Widget> {
///         match self.store.fetch(&request.id) {
///             Some(widget) => Envelope::success(widget),
///             None => Envelope::error("widget not found"),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handle the request, observing `cancel` at any internal await points.
    ///
    /// Semantic failures are reported inside the response envelope, not as
    /// control-flow faults.
    async fn handle(&self, request: R, cancel: &CancellationToken) -> R::Response;
}

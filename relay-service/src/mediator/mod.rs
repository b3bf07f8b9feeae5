//! Command/query dispatch with a composable behavior pipeline
//!
//! A [`Request`] is dispatched through [`Mediator::send`], which resolves the
//! single [`Handler`] registered for the request's runtime type and runs the
//! ordered chain of [`Behavior`]s around it. The chain is folded into one
//! composed callable when the mediator is built, so dispatch performs no
//! per-call chain construction.
//!
//! Registration happens once at startup through [`MediatorBuilder`]; the
//! resulting route table is immutable and safe for concurrent sends.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_service::prelude::*;
//!
//! let mediator = Mediator::builder()
//!     .register::<CreateWidget>(CreateWidgetHandler::new(store))
//!     .validator::<CreateWidget>(CreateWidgetValidator)
//!     .build()?;
//!
//! let outcome = mediator
//!     .send_enveloped(CreateWidget { name: "gear".into() }, CancellationToken::new())
//!     .await?;
//! ```

pub mod behavior;
pub mod dispatch;
pub mod handler;

pub use behavior::{Behavior, DispatchResult, Next};
pub use dispatch::{DispatchError, Mediator, MediatorBuilder};
pub use handler::{Handler, Request};

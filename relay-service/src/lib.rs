//! # relay-service
//!
//! Request-processing core for a service that accepts commands and queries,
//! runs them through a composable pipeline of cross-cutting behaviors, and
//! persists state through a layer that rewrites logical deletions as
//! timestamped tombstones.
//!
//! ## Pieces
//!
//! - **Envelope**: every handler reports through [`envelope::Envelope`],
//!   separating application errors from validation failures.
//! - **Mediator**: [`mediator::Mediator`] resolves the single handler for a
//!   request type and runs the pre-composed behavior chain around it.
//! - **Validation**: [`validation::ValidationBehavior`] rejects bad input
//!   before the handler runs, surfacing failures distinctly from errors.
//! - **Persistence**: [`persistence::UnitOfWork`] intercepts commits and
//!   diverts eligible deletions into tombstone updates.
//!
//! HTTP routing, auth, migrations, and storage-engine internals are external
//! collaborators and live outside this crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_service::prelude::*;
//!
//! let config = Config::load()?;
//! init_tracing(&config)?;
//!
//! let mediator = Mediator::builder()
//!     .register::<CreateWidget>(CreateWidgetHandler::new(store.clone()))
//!     .validator::<CreateWidget>(CreateWidgetValidator)
//!     .build()?;
//!
//! let outcome = mediator
//!     .send_enveloped(CreateWidget { name: "gear".into() }, CancellationToken::new())
//!     .await?;
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod mediator;
pub mod observability;
pub mod persistence;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::envelope::{Envelope, PageInfo, Payload, UnitResult, ValidationFailure};
    pub use crate::error::{Error, Result};
    pub use crate::ids::DispatchId;
    pub use crate::mediator::{
        Behavior, DispatchError, DispatchResult, Handler, Mediator, MediatorBuilder, Next, Request,
    };
    pub use crate::observability::init_tracing;
    pub use crate::persistence::{
        ChangeSession, Entity, EntityDescriptor, EntityMap, EntityState, Keyed, MemorySession,
        MemoryStore, PersistenceError, SoftDelete, TrackedEntry, UnitOfWork,
    };
    pub use crate::validation::{ValidationBehavior, Validator};

    pub use tokio_util::sync::CancellationToken;
}

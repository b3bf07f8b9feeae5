//! Top-level error type

use thiserror::Error;

use crate::mediator::DispatchError;
use crate::persistence::PersistenceError;

/// Crate-wide error type aggregating the fault categories.
///
/// Validation rejection is deliberately absent here: it travels inside the
/// response envelope, not as a fault.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or extraction failed
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Dispatch wiring fault or cancellation
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Entity-map wiring fault or commit failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

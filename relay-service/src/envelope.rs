//! Uniform result envelopes returned by request handlers
//!
//! Every handler reports its outcome through [`Envelope`], which carries a
//! payload plus two failure lists: `errors` for application/business errors
//! ("not found", "conflict") and `validation_failures` for rejected input.
//! Clients branch on which list is populated.
//!
//! The payload is a sum type rather than an inheritance ladder: a single
//! [`Envelope<T>`] holds [`Payload::Unit`], [`Payload::Single`], or
//! [`Payload::Page`], so unit, single-value, and paginated outcomes share one
//! set of factories without any field shadowing between levels.
//!
//! ## Example
//!
//! ```rust
//! use relay_service::envelope::{Envelope, ValidationFailure};
//!
//! let found: Envelope<u64> = Envelope::success(7);
//! assert!(found.successful());
//! assert_eq!(found.data(), Some(&7));
//!
//! let missing: Envelope<u64> = Envelope::error("widget not found");
//! assert!(!missing.successful());
//!
//! let rejected: Envelope<u64> = Envelope::validation_error([
//!     ValidationFailure::new("name", "must not be empty"),
//! ]);
//! assert!(!rejected.successful());
//! assert!(rejected.errors().is_empty());
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Validation failures
// ============================================================================

/// A single field-level validation failure
///
/// Produced by validators and surfaced to callers through
/// [`Envelope::validation_failures`], never through [`Envelope::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Name of the offending field
    pub field: String,
    /// Human-readable rejection message
    pub message: String,
}

impl ValidationFailure {
    /// Create a new validation failure
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Pagination metadata
// ============================================================================

/// Pagination metadata attached to a [`Payload::Page`]
///
/// The handler that produced the page populates these fields; the envelope
/// never computes them implicitly. The one derived value is
/// [`PageInfo::total_pages`], recomputed on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based page number of this page
    pub page_number: u64,
    /// Requested page size
    pub items_per_page: u64,
    /// Number of items on this page
    pub results_count: u64,
    /// Number of items across all pages
    pub total_results_count: u64,
}

impl PageInfo {
    /// Total number of pages: `ceil(total_results_count / items_per_page)`.
    ///
    /// A page size of zero means pagination was not requested and yields zero
    /// pages rather than a fault.
    pub fn total_pages(&self) -> u64 {
        if self.items_per_page == 0 {
            0
        } else {
            self.total_results_count.div_ceil(self.items_per_page)
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Payload carried by a successful [`Envelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload<T> {
    /// No data; the operation was a pure command
    Unit,
    /// A single value
    Single(T),
    /// A page of values plus pagination metadata
    Page {
        /// Items on this page
        items: Vec<T>,
        /// Caller-populated pagination metadata
        info: PageInfo,
    },
}

/// Immutable outcome wrapper returned by every handler
///
/// Constructed through factories only; there is no mutation after
/// construction. [`Envelope::successful`] is the sole authority on pass/fail
/// and is derived from the failure lists on every call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    payload: Payload<T>,
    errors: Vec<String>,
    validation_failures: Vec<ValidationFailure>,
}

/// Envelope with no payload, for unit-of-work style commands
pub type UnitResult = Envelope<()>;

impl<T> Envelope<T> {
    /// Success envelope carrying a single value
    pub fn success(data: T) -> Self {
        Self {
            payload: Payload::Single(data),
            errors: Vec::new(),
            validation_failures: Vec::new(),
        }
    }

    /// Success envelope carrying a page of values
    ///
    /// `info` is the caller's responsibility: the handler fills in the page
    /// number, page size, and counts before returning.
    pub fn page(items: Vec<T>, info: PageInfo) -> Self {
        Self {
            payload: Payload::Page { items, info },
            errors: Vec::new(),
            validation_failures: Vec::new(),
        }
    }

    /// Failure envelope with a single application error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            payload: Payload::Unit,
            errors: vec![message.into()],
            validation_failures: Vec::new(),
        }
    }

    /// Failure envelope with several application errors
    pub fn error_many<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payload: Payload::Unit,
            errors: messages.into_iter().map(Into::into).collect(),
            validation_failures: Vec::new(),
        }
    }

    /// Failure envelope with field-level validation failures
    pub fn validation_error(failures: impl IntoIterator<Item = ValidationFailure>) -> Self {
        Self {
            payload: Payload::Unit,
            errors: Vec::new(),
            validation_failures: failures.into_iter().collect(),
        }
    }

    /// Whether the operation succeeded: both failure lists are empty.
    ///
    /// Derived on every call, never cached.
    pub fn successful(&self) -> bool {
        self.errors.is_empty() && self.validation_failures.is_empty()
    }

    /// The single-value payload, if present
    pub fn data(&self) -> Option<&T> {
        match &self.payload {
            Payload::Single(data) => Some(data),
            _ => None,
        }
    }

    /// Consume the envelope, yielding the single-value payload
    pub fn into_data(self) -> Option<T> {
        match self.payload {
            Payload::Single(data) => Some(data),
            _ => None,
        }
    }

    /// Items of a page payload; empty for other payloads
    pub fn items(&self) -> &[T] {
        match &self.payload {
            Payload::Page { items, .. } => items,
            _ => &[],
        }
    }

    /// Pagination metadata of a page payload
    pub fn page_info(&self) -> Option<&PageInfo> {
        match &self.payload {
            Payload::Page { info, .. } => Some(info),
            _ => None,
        }
    }

    /// Application/business errors
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Field-level validation failures
    pub fn validation_failures(&self) -> &[ValidationFailure] {
        &self.validation_failures
    }
}

impl Envelope<()> {
    /// Success envelope with no payload
    pub fn unit() -> Self {
        Self {
            payload: Payload::Unit,
            errors: Vec::new(),
            validation_failures: Vec::new(),
        }
    }
}

//! Error types for query construction.
//!
//! Execution-side failures (store timeouts, connection loss) stay `anyhow`
//! inside the store collaborators; this enum covers the failures query
//! construction itself can produce.

use crate::sortable::ValueKind;

/// Errors raised while building a statement from request parameters.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The descriptor's declared kind has no registered string conversion.
    /// Raised only when a cast is actually attempted, never during
    /// descriptor resolution.
    #[error("no converter registered for {kind} values")]
    NoConverter { kind: ValueKind },

    /// The raw value could not be parsed as the descriptor's kind.
    #[error("value {value:?} is not a valid {kind}")]
    InvalidValue { value: String, kind: ValueKind },
}

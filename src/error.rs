//! Error types for the dynamic attribute store.

use dynnet_types::key::EntityId;
use dynnet_types::value::ValueType;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DynError>;

/// Errors raised by the interval index, attribute records, and stores.
///
/// Ambiguous overlaps never fail an insert. They are reported through
/// insert outcomes and store statistics.
#[derive(Debug, Error)]
pub enum DynError {
    /// Interval whose start lies after its end.
    #[error("malformed interval: start {start} is after end {end}")]
    MalformedInterval { start: f64, end: f64 },

    /// Interval or window endpoint that is not a number.
    #[error("interval endpoint is NaN")]
    NanEndpoint,

    /// Double payload that is NaN or infinite.
    #[error("attribute value {0} is not a finite number")]
    NonFiniteValue(f64),

    /// Lookup of a `(column, entity)` pair that was never inserted.
    #[error("unknown attribute '{column}' for entity {entity}")]
    UnknownKey { column: String, entity: EntityId },

    /// Aggregate over a column that no entity carries.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// External identifier that was never registered.
    #[error("unknown external id '{0}'")]
    UnknownExternalId(String),

    /// Value type differs from the type the record was created with.
    #[error("type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DynError {
    pub(crate) fn unknown_key(column: &str, entity: EntityId) -> Self {
        DynError::UnknownKey {
            column: column.to_string(),
            entity,
        }
    }

    /// Whether this error signals a missing key rather than bad input.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DynError::UnknownKey { .. }
                | DynError::UnknownColumn(_)
                | DynError::UnknownExternalId(_)
        )
    }
}

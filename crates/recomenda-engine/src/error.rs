//! Error types for the recommendation engine.
//!
//! Empty inputs, unknown ids and degenerate vectors are not errors; they
//! produce empty or fallback results. Only broken internal invariants and
//! invalid configuration surface here.

use crate::config::ConfigError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while computing recommendations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A matrix or similarity table does not match the ids it is indexed by.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A row or column id appears more than once.
    #[error("duplicate id in {what}: {id}")]
    DuplicateId { what: &'static str, id: String },

    /// Configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

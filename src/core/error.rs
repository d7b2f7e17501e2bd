use thiserror::Error;

/// Malformed descriptor input, reported before any iteration runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("constraint groups break at offset {offset}, expected a group boundary at {expected}")]
    GroupLayout { offset: usize, expected: usize },

    #[error("friction coefficient {mu} at offset {offset} must be finite and non-negative")]
    InvalidFriction { offset: usize, mu: f64 },

    #[error("{what} contains a non-finite value at index {index}")]
    NonFiniteInput { what: &'static str, index: usize },
}

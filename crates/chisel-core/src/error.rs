//! Error types for the Chisel core.

use thiserror::Error;

/// Errors raised when reading a bound argument back as a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// No argument with this name was bound.
    #[error("argument '{0}' is not bound")]
    Missing(String),

    /// The argument holds a value of another kind.
    #[error("argument '{name}' is {found}, expected {expected}")]
    TypeMismatch {
        /// Argument name.
        name: String,
        /// Requested kind.
        expected: &'static str,
        /// Stored kind.
        found: &'static str,
    },
}

/// Result type for argument conversions.
pub type ArgumentResult<T> = Result<T, ArgumentError>;

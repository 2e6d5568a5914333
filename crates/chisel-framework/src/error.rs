//! Error types for the Chisel framework.
//!
//! "No match" is deliberately absent from this module: a cutter or filter
//! that does not accept its input reports [`Cut::Unmatched`] or a failed
//! [`Decision`], never an error. The types here cover the remaining classes:
//! configuration mistakes caught at construction, programming errors caught
//! during evaluation, and reaction failures.
//!
//! [`Cut::Unmatched`]: crate::cutter::Cut::Unmatched
//! [`Decision`]: chisel_core::Decision

use thiserror::Error;
pub use tower::BoxError;

use chisel_core::ArgumentError;

/// Errors detected while building cutters, filters or commands.
///
/// These fail fast at registration time and never occur during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// List bounds where the minimum exceeds the maximum.
    #[error("invalid list bounds: min_length {min} is greater than max_length {max}")]
    InvalidBounds {
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },

    /// An alias appears in both the true and the false set.
    #[error("alias '{0}' is both a true and a false value")]
    OverlappingAliases(String),

    /// An alias or literal word is empty.
    #[error("empty alias in {0}")]
    EmptyAlias(&'static str),

    /// A matcher was configured without any word to match.
    #[error("{0} requires at least one word")]
    NoWords(&'static str),

    /// Two argument cutters share a name.
    #[error("command '{command}' declares argument '{argument}' twice")]
    DuplicateArgument {
        /// Command name.
        command: String,
        /// Duplicated argument name.
        argument: String,
    },

    /// A command was built without a reaction.
    #[error("command '{0}' has no reaction")]
    MissingReaction(String),

    /// A command was built without accepted event types.
    #[error("command '{0}' accepts no event types")]
    NoEventTypes(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A matched piece of text could not be converted to its target type.
///
/// This means a cutter's pattern accepted text its converter rejects, which
/// is a defect in the cutter rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{text}' to {target}: {reason}")]
pub struct CutterError {
    /// The matched text.
    pub text: String,
    /// Target type name.
    pub target: &'static str,
    /// Converter message.
    pub reason: String,
}

impl CutterError {
    pub fn new(text: impl Into<String>, target: &'static str, reason: impl ToString) -> Self {
        Self {
            text: text.into(),
            target,
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by a filter while making its decision.
#[derive(Debug, Error)]
pub enum FilterError {
    /// An argument cutter failed internally.
    #[error(transparent)]
    Cutter(#[from] CutterError),

    /// Custom filter failure.
    #[error("{0}")]
    Custom(String),
}

impl FilterError {
    /// Creates a custom filter error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for filter decisions.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event type does not match the expected type.
    #[error("event type mismatch: expected '{expected}'")]
    EventTypeMismatch {
        /// Expected type name.
        expected: &'static str,
    },

    /// A bound argument could not be read.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A failure raised while a reaction ran.
///
/// Reaction failures are caught at the command boundary and recorded as
/// text; they never reach the dispatcher.
#[derive(Debug, Error)]
pub enum ReactionError {
    /// A reaction parameter could not be extracted.
    #[error("failed to extract reaction parameter: {0}")]
    Extract(#[from] ExtractError),

    /// The reaction returned an error.
    #[error("{0}")]
    Failed(BoxError),

    /// The reaction panicked.
    #[error("reaction panicked: {0}")]
    Panicked(String),
}

impl ReactionError {
    /// Wraps any error-like value returned by a reaction.
    ///
    /// A `ReactionError` passed back through `?` is unwrapped instead of
    /// being nested.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        let err: BoxError = err.into();
        match err.downcast::<ReactionError>() {
            Ok(inner) => *inner,
            Err(other) => Self::Failed(other),
        }
    }

    /// Renders the error together with its source chain.
    pub fn render(&self) -> String {
        let mut text = self.to_string();
        let mut source = match self {
            Self::Failed(inner) => inner.source(),
            Self::Extract(inner) => std::error::Error::source(inner),
            Self::Panicked(_) => None,
        };
        while let Some(cause) = source {
            text.push_str("\n  caused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

/// Result type returned by reactions.
pub type ReactionResult = Result<(), ReactionError>;

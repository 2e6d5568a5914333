//! Text cutters: composable parsers that consume a prefix of a string.
//!
//! A cutter looks at the front of the remaining text, and either produces a
//! typed value together with the unconsumed suffix, or reports that nothing
//! it understands starts here. Not matching is an ordinary outcome
//! ([`Cut::Unmatched`]), not an error; only a converter rejecting text its
//! own pattern accepted produces a [`CutterError`].
//!
//! # Built-in cutters
//!
//! | Cutter            | Output      | Accepts                                   |
//! |-------------------|-------------|-------------------------------------------|
//! | [`BoolCutter`]    | `bool`      | configurable yes/no aliases               |
//! | [`FloatCutter`]   | `f64`       | `-12`, `+3.5`                             |
//! | [`IntegerCutter`] | `i64`       | `-12`, `+3`                               |
//! | [`ListCutter`]    | `Vec<T>`    | whitespace separated repetitions          |
//! | [`PatternCutter`] | any         | a user pattern plus an extractor          |
//! | [`WordCutter`]    | `String`    | one run of non-whitespace                 |
//! | [`StringCutter`]  | `String`    | everything that is left                   |
//! | [`LiteralCutter`] | `String`    | one of a fixed set of words               |
//!
//! Cutters are immutable after construction. Compiled patterns are built
//! once, so `cut_part` is a pure function of its input.

mod boolean;
mod list;
mod numeric;
mod pattern;
mod text;

use std::sync::Arc;

use regex::Regex;

use chisel_core::ArgValue;

use crate::error::CutterError;

pub use boolean::{BoolConfig, BoolCutter, DEFAULT_FALSE_VALUES, DEFAULT_TRUE_VALUES};
pub use list::{ListConfig, ListCutter};
pub use numeric::{FloatCutter, IntegerCutter};
pub use pattern::PatternCutter;
pub use text::{LiteralCutter, StringCutter, WordCutter};

/// The outcome of a single cut.
#[derive(Debug, Clone, PartialEq)]
pub enum Cut<'a, T> {
    /// A value was parsed; `remainder` is the text after it.
    Matched { value: T, remainder: &'a str },
    /// Nothing could be parsed; `remainder` is the untouched input.
    Unmatched { remainder: &'a str },
}

impl<'a, T> Cut<'a, T> {
    pub fn matched(value: T, remainder: &'a str) -> Self {
        Self::Matched { value, remainder }
    }

    pub fn unmatched(remainder: &'a str) -> Self {
        Self::Unmatched { remainder }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Returns the text left after this cut.
    pub fn remainder(&self) -> &'a str {
        match self {
            Self::Matched { remainder, .. } | Self::Unmatched { remainder } => remainder,
        }
    }

    /// Returns the parsed value, discarding the remainder.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Matched { value, .. } => Some(value),
            Self::Unmatched { .. } => None,
        }
    }

    /// Converts the parsed value, keeping the remainder.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Cut<'a, U> {
        match self {
            Self::Matched { value, remainder } => Cut::Matched {
                value: f(value),
                remainder,
            },
            Self::Unmatched { remainder } => Cut::Unmatched { remainder },
        }
    }
}

/// Result type for cutters.
pub type CutResult<'a, T> = Result<Cut<'a, T>, CutterError>;

// ============================================================================
// TextCutter Trait
// ============================================================================

/// A parser that consumes a typed value from the front of a string.
///
/// Implementations must:
/// - consume the longest prefix their grammar accepts,
/// - return the exact unconsumed suffix,
/// - return the input unchanged inside [`Cut::Unmatched`] when nothing
///   matches,
/// - be free of side effects, so the same input always yields the same cut.
pub trait TextCutter: Send + Sync {
    /// The value produced on a match.
    type Output: Into<ArgValue> + Send;

    /// Cuts one value from the front of `remaining`.
    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, Self::Output>;

    /// Human-readable description of the accepted syntax, for help texts.
    fn usage_description(&self) -> String;
}

/// Object-safe form of [`TextCutter`] producing [`ArgValue`]s.
///
/// Implemented for every `TextCutter`, so any cutter can be stored behind a
/// [`BoxedCutter`] regardless of its output type.
pub trait ErasedCutter: Send + Sync {
    fn cut_value<'a>(&self, remaining: &'a str) -> CutResult<'a, ArgValue>;

    fn usage_description(&self) -> String;
}

impl<C: TextCutter> ErasedCutter for C {
    fn cut_value<'a>(&self, remaining: &'a str) -> CutResult<'a, ArgValue> {
        Ok(self.cut_part(remaining)?.map(Into::into))
    }

    fn usage_description(&self) -> String {
        TextCutter::usage_description(self)
    }
}

/// A type-erased, shareable cutter.
pub type BoxedCutter = Arc<dyn ErasedCutter>;

/// Wraps a cutter into a [`BoxedCutter`].
pub fn boxed<C: TextCutter + 'static>(cutter: C) -> BoxedCutter {
    Arc::new(cutter)
}

/// Applies an anchored pattern to `remaining` and converts the whole match.
///
/// `regex` must be anchored with `\A`; the match then always starts at the
/// front of the input and its end is the split point.
pub(crate) fn cut_via_regex<'a, T>(
    regex: &Regex,
    remaining: &'a str,
    convert: impl FnOnce(&str) -> Result<Option<T>, CutterError>,
) -> CutResult<'a, T> {
    let Some(found) = regex.find(remaining) else {
        return Ok(Cut::unmatched(remaining));
    };
    debug_assert_eq!(found.start(), 0);
    match convert(found.as_str())? {
        Some(value) => Ok(Cut::matched(value, &remaining[found.end()..])),
        None => Ok(Cut::unmatched(remaining)),
    }
}

/// Compiles a pattern built at construction time.
pub(crate) fn compile(pattern: &str) -> Result<Regex, crate::error::ConfigError> {
    Regex::new(pattern).map_err(|err| crate::error::ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

/// Builds a case-insensitive alternation of literal words, longest first.
///
/// Duplicates differing only by case collapse to the first spelling seen.
pub(crate) fn literal_alternation<'w>(
    words: impl IntoIterator<Item = &'w str>,
) -> Vec<&'w str> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<&str> = words
        .into_iter()
        .filter(|word| seen.insert(word.to_lowercase()))
        .collect();
    unique.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    unique
}

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};

use chisel_core::ArgValue;

use super::{Cut, CutResult, TextCutter, compile};
use crate::error::ConfigResult;

type Extractor<T> = Arc<dyn Fn(&Captures<'_>) -> Option<T> + Send + Sync>;

/// A cutter built from one pattern and an extractor.
///
/// The pattern is anchored to the start of the remaining text and compiled
/// in multi-line mode. The extractor turns the captures into the output
/// value; returning `None` makes the cut unmatched.
///
/// ```rust,ignore
/// let hex = PatternCutter::new(r"0x([0-9a-f]+)", "a hex number", |caps| {
///     i64::from_str_radix(&caps[1], 16).ok()
/// })?;
/// ```
pub struct PatternCutter<T> {
    regex: Regex,
    description: String,
    extractor: Extractor<T>,
}

impl<T> PatternCutter<T> {
    pub fn new<F>(pattern: &str, description: impl Into<String>, extractor: F) -> ConfigResult<Self>
    where
        F: Fn(&Captures<'_>) -> Option<T> + Send + Sync + 'static,
    {
        Ok(Self {
            regex: compile(&format!(r"(?m)\A(?:{pattern})"))?,
            description: description.into(),
            extractor: Arc::new(extractor),
        })
    }
}

impl PatternCutter<String> {
    /// Extracts the first capture group, or the whole match if the pattern
    /// has no groups.
    pub fn capture(pattern: &str, description: impl Into<String>) -> ConfigResult<Self> {
        Self::new(pattern, description, |caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
    }
}

impl<T> Clone for PatternCutter<T> {
    fn clone(&self) -> Self {
        Self {
            regex: self.regex.clone(),
            description: self.description.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<T> fmt::Debug for PatternCutter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternCutter")
            .field("pattern", &self.regex.as_str())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T> TextCutter for PatternCutter<T>
where
    T: Into<ArgValue> + Send + 'static,
{
    type Output = T;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, T> {
        let Some(caps) = self.regex.captures(remaining) else {
            return Ok(Cut::unmatched(remaining));
        };
        let end = caps.get(0).map_or(0, |m| m.end());
        Ok(match (self.extractor)(&caps) {
            Some(value) => Cut::matched(value, &remaining[end..]),
            None => Cut::unmatched(remaining),
        })
    }

    fn usage_description(&self) -> String {
        self.description.clone()
    }
}

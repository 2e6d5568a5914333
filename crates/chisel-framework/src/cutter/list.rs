use super::{Cut, CutResult, TextCutter};
use crate::error::{ConfigError, ConfigResult};

/// Options for a [`ListCutter`].
#[derive(Debug, Clone)]
pub struct ListConfig<C> {
    /// The cutter applied to each element.
    pub element: C,
    /// Fewest elements that make a match. Defaults to 1.
    pub min_length: usize,
    /// Most elements consumed; `None` means unbounded.
    pub max_length: Option<usize>,
}

impl<C> ListConfig<C> {
    pub fn of(element: C) -> Self {
        Self {
            element,
            min_length: 1,
            max_length: None,
        }
    }

    pub fn min(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn max(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Repeats an element cutter over whitespace-separated input.
///
/// The list stops at the first element that does not match or once
/// `max_length` elements were taken. Whitespace is skipped only in front of
/// elements that actually match, so on a stop the remainder still starts
/// with the separator before the rejected text.
///
/// When fewer than `min_length` elements match, the whole list is unmatched
/// and the original input is returned untouched.
#[derive(Debug, Clone)]
pub struct ListCutter<C> {
    element: C,
    min_length: usize,
    max_length: Option<usize>,
}

impl<C: TextCutter> ListCutter<C> {
    pub fn new(config: ListConfig<C>) -> ConfigResult<Self> {
        match config.max_length {
            Some(max) if config.min_length > max => {
                return Err(ConfigError::InvalidBounds {
                    min: config.min_length,
                    max,
                });
            }
            _ => {}
        }

        Ok(Self {
            element: config.element,
            min_length: config.min_length,
            max_length: config.max_length,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn has_room(&self, taken: usize) -> bool {
        self.max_length.is_none_or(|max| taken < max)
    }
}

impl<C: TextCutter> TextCutter for ListCutter<C> {
    type Output = Vec<C::Output>;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, Self::Output> {
        let mut values = Vec::new();
        let mut rest = remaining;

        while self.has_room(values.len()) {
            let attempt = rest.trim_start();
            match self.element.cut_part(attempt)? {
                // An element that consumes nothing would repeat forever.
                Cut::Matched { remainder, .. } if remainder.len() == attempt.len() => break,
                Cut::Matched { value, remainder } => {
                    values.push(value);
                    rest = remainder;
                }
                Cut::Unmatched { .. } => break,
            }
        }

        if values.len() >= self.min_length {
            Ok(Cut::matched(values, rest))
        } else {
            Ok(Cut::unmatched(remaining))
        }
    }

    fn usage_description(&self) -> String {
        let count = match (self.min_length, self.max_length) {
            (min, Some(max)) if min == max => format!("exactly {min}"),
            (min, Some(max)) => format!("from {min} to {max}"),
            (min, None) => format!("at least {min}"),
        };
        format!(
            "{count} whitespace-separated values, each {}",
            self.element.usage_description()
        )
    }
}

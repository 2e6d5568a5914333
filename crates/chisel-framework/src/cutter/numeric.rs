use std::sync::LazyLock;

use regex::Regex;

use super::{CutResult, TextCutter, cut_via_regex};
use crate::error::CutterError;

// ASCII digits only; `\d` would also accept digits the parsers reject.
static FLOAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[+-]?[0-9]+(?:\.[0-9]+)?").expect("valid float pattern"));

static INTEGER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[+-]?[0-9]+").expect("valid integer pattern"));

/// Matches a signed decimal number with an optional fractional part.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCutter;

impl FloatCutter {
    pub fn new() -> Self {
        Self
    }
}

impl TextCutter for FloatCutter {
    type Output = f64;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, f64> {
        cut_via_regex(&FLOAT_REGEX, remaining, |text| {
            text.parse::<f64>()
                .map(Some)
                .map_err(|err| CutterError::new(text, "float", err))
        })
    }

    fn usage_description(&self) -> String {
        "a number, optionally signed and with a fractional part (e.g. 12, -3.5)".to_string()
    }
}

/// Matches a signed whole number that fits in an `i64`.
///
/// Digits that overflow are treated as unmatched input rather than an
/// error, since the pattern cannot express the range.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCutter;

impl IntegerCutter {
    pub fn new() -> Self {
        Self
    }
}

impl TextCutter for IntegerCutter {
    type Output = i64;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, i64> {
        cut_via_regex(&INTEGER_REGEX, remaining, |text| Ok(text.parse::<i64>().ok()))
    }

    fn usage_description(&self) -> String {
        "a whole number, optionally signed (e.g. 42, -7)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutter::Cut;

    #[test]
    fn test_float_round_trip() {
        let cutter = FloatCutter::new();

        for value in [0.0, 1.0, -1.5, 3.25, 123456.789, -0.001, 1e10, 42.0] {
            let text = format!("{value}");
            // Display never emits exponents, so the fixed pattern covers it.
            let cut = cutter.cut_part(&text).unwrap();
            assert_eq!(cut, Cut::matched(value, ""), "{text}");
        }
    }

    #[test]
    fn test_float_stops_at_non_numeric() {
        let cutter = FloatCutter::new();

        assert_eq!(cutter.cut_part("+2.5kg").unwrap(), Cut::matched(2.5, "kg"));
        assert_eq!(cutter.cut_part("7. apples").unwrap(), Cut::matched(7.0, ". apples"));
        assert_eq!(cutter.cut_part(".5").unwrap(), Cut::unmatched(".5"));
        assert_eq!(cutter.cut_part(" 1").unwrap(), Cut::unmatched(" 1"));
    }

    #[test]
    fn test_float_rejects_non_ascii_digits() {
        let cutter = FloatCutter::new();
        assert_eq!(cutter.cut_part("٣").unwrap(), Cut::unmatched("٣"));
    }

    #[test]
    fn test_integer_cuts() {
        let cutter = IntegerCutter::new();

        assert_eq!(cutter.cut_part("-12 left").unwrap(), Cut::matched(-12, " left"));
        assert_eq!(cutter.cut_part("3.5").unwrap(), Cut::matched(3, ".5"));
        assert_eq!(cutter.cut_part("abc").unwrap(), Cut::unmatched("abc"));
    }

    #[test]
    fn test_integer_overflow_is_unmatched() {
        let cutter = IntegerCutter::new();
        let huge = "99999999999999999999999";

        assert_eq!(cutter.cut_part(huge).unwrap(), Cut::unmatched(huge));
    }

    #[test]
    fn test_usage_description_is_stable() {
        assert_eq!(
            FloatCutter::new().usage_description(),
            FloatCutter::new().usage_description()
        );
    }
}

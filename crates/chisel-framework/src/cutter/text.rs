use std::sync::LazyLock;

use regex::Regex;

use super::{Cut, CutResult, TextCutter, compile, cut_via_regex, literal_alternation};
use crate::error::{ConfigError, ConfigResult};

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\S+").expect("valid word pattern"));

static STRING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A.+").expect("valid string pattern"));

/// Matches one run of non-whitespace characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCutter;

impl WordCutter {
    pub fn new() -> Self {
        Self
    }
}

impl TextCutter for WordCutter {
    type Output = String;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, String> {
        cut_via_regex(&WORD_REGEX, remaining, |text| Ok(Some(text.to_string())))
    }

    fn usage_description(&self) -> String {
        "a single word without spaces".to_string()
    }
}

/// Consumes all remaining text, line breaks included.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCutter;

impl StringCutter {
    pub fn new() -> Self {
        Self
    }
}

impl TextCutter for StringCutter {
    type Output = String;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, String> {
        cut_via_regex(&STRING_REGEX, remaining, |text| Ok(Some(text.to_string())))
    }

    fn usage_description(&self) -> String {
        "any text".to_string()
    }
}

/// Matches one of a fixed set of words, case-insensitively.
///
/// The word must end at a word boundary, so `list` does not match the front
/// of `listing`. On a match the canonical spelling from the configuration is
/// returned, not the user's casing.
#[derive(Debug, Clone)]
pub struct LiteralCutter {
    regex: Regex,
    words: Vec<String>,
}

impl LiteralCutter {
    pub fn new<I, S>(words: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        if words.is_empty() {
            return Err(ConfigError::NoWords("literal cutter"));
        }
        if words.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyAlias("literal cutter"));
        }

        let words: Vec<String> = literal_alternation(words.iter().map(String::as_str))
            .into_iter()
            .map(str::to_string)
            .collect();
        let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        let regex = compile(&format!(
            r"(?i)\A({})(?:\z|[^\p{{Alphabetic}}\p{{N}}])",
            alternatives.join("|")
        ))?;

        Ok(Self { regex, words })
    }

    /// The accepted words, longest first.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    fn canonical(&self, matched: &str) -> String {
        let lowered = matched.to_lowercase();
        self.words
            .iter()
            .find(|word| word.to_lowercase() == lowered)
            .cloned()
            .unwrap_or_else(|| matched.to_string())
    }
}

impl TextCutter for LiteralCutter {
    type Output = String;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, String> {
        let Some(found) = self.regex.captures(remaining).and_then(|caps| caps.get(1)) else {
            return Ok(Cut::unmatched(remaining));
        };
        Ok(Cut::matched(
            self.canonical(found.as_str()),
            &remaining[found.end()..],
        ))
    }

    fn usage_description(&self) -> String {
        match self.words.as_slice() {
            [single] => format!("the word '{single}'"),
            words => format!("one of: {}", words.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_cutter() {
        let cutter = WordCutter::new();

        assert_eq!(
            cutter.cut_part("hello world").unwrap(),
            Cut::matched("hello".to_string(), " world")
        );
        assert_eq!(cutter.cut_part(" lead").unwrap(), Cut::unmatched(" lead"));
    }

    #[test]
    fn test_string_cutter_takes_everything() {
        let cutter = StringCutter::new();

        assert_eq!(
            cutter.cut_part("two\nlines ").unwrap(),
            Cut::matched("two\nlines ".to_string(), "")
        );
        assert_eq!(cutter.cut_part("").unwrap(), Cut::unmatched(""));
    }

    #[test]
    fn test_literal_requires_boundary() {
        let cutter = LiteralCutter::new(["list"]).unwrap();

        assert_eq!(
            cutter.cut_part("LIST 1 2").unwrap(),
            Cut::matched("list".to_string(), " 1 2")
        );
        assert_eq!(
            cutter.cut_part("list!").unwrap(),
            Cut::matched("list".to_string(), "!")
        );
        assert_eq!(cutter.cut_part("listing").unwrap(), Cut::unmatched("listing"));
    }

    #[test]
    fn test_literal_falls_back_to_shorter_word_at_boundary() {
        let cutter = LiteralCutter::new(["a", "a-b"]).unwrap();

        assert_eq!(
            cutter.cut_part("a-bc").unwrap(),
            Cut::matched("a".to_string(), "-bc")
        );
    }

    #[test]
    fn test_literal_prefers_longest_word() {
        let cutter = LiteralCutter::new(["add", "address"]).unwrap();

        assert_eq!(
            cutter.cut_part("address x").unwrap(),
            Cut::matched("address".to_string(), " x")
        );
    }

    #[test]
    fn test_literal_rejects_empty_sets() {
        assert_eq!(
            LiteralCutter::new(Vec::<String>::new()).unwrap_err(),
            ConfigError::NoWords("literal cutter")
        );
        assert_eq!(
            LiteralCutter::new([""]).unwrap_err(),
            ConfigError::EmptyAlias("literal cutter")
        );
    }
}

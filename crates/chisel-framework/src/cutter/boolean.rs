use regex::Regex;

use super::{Cut, CutResult, TextCutter, compile, literal_alternation};
use crate::error::{ConfigError, ConfigResult};

/// Aliases accepted as `true` by every [`BoolCutter`].
pub const DEFAULT_TRUE_VALUES: &[&str] = &[
    "true", "1", "yes", "y", "да", "д", "истина", "+", "правда", "t", "on", "вкл", "enable",
];

/// Aliases accepted as `false` by every [`BoolCutter`].
pub const DEFAULT_FALSE_VALUES: &[&str] = &[
    "false", "0", "no", "n", "нет", "н", "ложь", "-", "неправда", "f", "off", "выкл", "disable",
];

/// Extra aliases for a [`BoolCutter`], added on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolConfig {
    pub true_extension: Vec<String>,
    pub false_extension: Vec<String>,
}

impl BoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds aliases that mean `true`.
    pub fn with_true<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.true_extension
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Adds aliases that mean `false`.
    pub fn with_false<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.false_extension
            .extend(aliases.into_iter().map(Into::into));
        self
    }
}

/// Matches a yes/no alias, case-insensitively.
///
/// Both alias sets are frozen into one compiled pattern each. When both sets
/// match a prefix, the longer match wins.
#[derive(Debug, Clone)]
pub struct BoolCutter {
    true_regex: Regex,
    false_regex: Regex,
    true_values: Vec<String>,
    false_values: Vec<String>,
}

impl BoolCutter {
    /// Builds a cutter from the default aliases plus `config`.
    ///
    /// Fails if an alias is empty or appears in both sets.
    pub fn new(config: BoolConfig) -> ConfigResult<Self> {
        let true_values = merge_aliases(DEFAULT_TRUE_VALUES, &config.true_extension, "true_extension")?;
        let false_values = merge_aliases(DEFAULT_FALSE_VALUES, &config.false_extension, "false_extension")?;

        if let Some(shared) = true_values
            .iter()
            .find(|t| false_values.iter().any(|f| f.to_lowercase() == t.to_lowercase()))
        {
            return Err(ConfigError::OverlappingAliases(shared.clone()));
        }

        Ok(Self {
            true_regex: alias_regex(&true_values)?,
            false_regex: alias_regex(&false_values)?,
            true_values,
            false_values,
        })
    }

    /// Aliases accepted as `true`, longest first.
    pub fn true_values(&self) -> &[String] {
        &self.true_values
    }

    /// Aliases accepted as `false`, longest first.
    pub fn false_values(&self) -> &[String] {
        &self.false_values
    }
}

impl Default for BoolCutter {
    fn default() -> Self {
        let alternation = |values: &[&str]| -> Vec<String> {
            literal_alternation(values.iter().copied())
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        let true_values = alternation(DEFAULT_TRUE_VALUES);
        let false_values = alternation(DEFAULT_FALSE_VALUES);
        Self {
            true_regex: Regex::new(&alias_pattern(&true_values)).expect("default true aliases"),
            false_regex: Regex::new(&alias_pattern(&false_values)).expect("default false aliases"),
            true_values,
            false_values,
        }
    }
}

impl TextCutter for BoolCutter {
    type Output = bool;

    fn cut_part<'a>(&self, remaining: &'a str) -> CutResult<'a, bool> {
        let true_len = self.true_regex.find(remaining).map(|m| m.end());
        let false_len = self.false_regex.find(remaining).map(|m| m.end());

        let cut = match (true_len, false_len) {
            (Some(t), Some(f)) if f > t => Cut::matched(false, &remaining[f..]),
            (Some(t), _) => Cut::matched(true, &remaining[t..]),
            (None, Some(f)) => Cut::matched(false, &remaining[f..]),
            (None, None) => Cut::unmatched(remaining),
        };
        Ok(cut)
    }

    fn usage_description(&self) -> String {
        format!(
            "a yes/no value; true is one of: {}; false is one of: {}",
            self.true_values.join(", "),
            self.false_values.join(", "),
        )
    }
}

fn merge_aliases(
    defaults: &[&str],
    extension: &[String],
    field: &'static str,
) -> ConfigResult<Vec<String>> {
    if extension.iter().any(|alias| alias.is_empty()) {
        return Err(ConfigError::EmptyAlias(field));
    }
    let words = defaults
        .iter()
        .copied()
        .chain(extension.iter().map(String::as_str));
    Ok(literal_alternation(words)
        .into_iter()
        .map(str::to_string)
        .collect())
}

fn alias_pattern(values: &[String]) -> String {
    let alternatives: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
    format!(r"(?i)\A(?:{})", alternatives.join("|"))
}

fn alias_regex(values: &[String]) -> ConfigResult<Regex> {
    compile(&alias_pattern(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutter() -> BoolCutter {
        BoolCutter::new(BoolConfig::new().with_true(["sure"]).with_false(["nope"])).unwrap()
    }

    #[test]
    fn test_every_alias_in_any_case_matches_fully() {
        let cutter = cutter();

        for alias in cutter.true_values().to_vec() {
            for form in [alias.clone(), alias.to_uppercase(), alias.to_lowercase()] {
                assert_eq!(cutter.cut_part(&form).unwrap(), Cut::matched(true, ""), "{form}");
            }
        }
        for alias in cutter.false_values().to_vec() {
            for form in [alias.clone(), alias.to_uppercase(), alias.to_lowercase()] {
                assert_eq!(cutter.cut_part(&form).unwrap(), Cut::matched(false, ""), "{form}");
            }
        }
    }

    #[test]
    fn test_longest_alias_wins() {
        let cutter = BoolCutter::default();

        // "no" must not stop at "n", and "неправда" must not stop at "н".
        assert_eq!(cutter.cut_part("no way").unwrap(), Cut::matched(false, " way"));
        assert_eq!(cutter.cut_part("неправда").unwrap(), Cut::matched(false, ""));
        assert_eq!(cutter.cut_part("Yes!").unwrap(), Cut::matched(true, "!"));
    }

    #[test]
    fn test_unmatched_returns_input() {
        let cutter = BoolCutter::default();
        assert_eq!(cutter.cut_part("maybe").unwrap(), Cut::unmatched("maybe"));
        assert_eq!(cutter.cut_part("").unwrap(), Cut::unmatched(""));
    }

    #[test]
    fn test_extensions_are_literal() {
        let cutter = BoolCutter::new(BoolConfig::new().with_true(["a.b"])).unwrap();

        assert_eq!(cutter.cut_part("a.b").unwrap(), Cut::matched(true, ""));
        assert_eq!(cutter.cut_part("axb").unwrap(), Cut::unmatched("axb"));
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert_eq!(
            BoolCutter::new(BoolConfig::new().with_true(["OFF"])).unwrap_err(),
            ConfigError::OverlappingAliases("OFF".into())
        );
        assert_eq!(
            BoolCutter::new(BoolConfig::new().with_false([""])).unwrap_err(),
            ConfigError::EmptyAlias("false_extension")
        );
    }

    #[test]
    fn test_usage_description_is_stable() {
        let cutter = cutter();
        assert_eq!(cutter.usage_description(), cutter.usage_description());
        assert!(cutter.usage_description().contains("sure"));
    }
}

//! Filters: pass/fail decisions that decide whether a command fires.
//!
//! A command runs its filters strictly in declaration order and stops at the
//! first failure. Filters share one [`FilterContext`] per evaluation; it
//! carries a parse cursor into the message text, so argument filters consume
//! the text one after another, each starting where the previous stopped.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use chisel_core::{ArgValue, Arguments, BoxedEvent, Decision};

use crate::cutter::{BoxedCutter, Cut, LiteralCutter, TextCutter};
use crate::error::{ConfigError, ConfigResult, FilterResult};

// ============================================================================
// Filter Context
// ============================================================================

/// Per-evaluation state shared by the filters of one command.
pub struct FilterContext {
    event: BoxedEvent,
    text: String,
    cursor: usize,
    arguments: Arguments,
}

impl FilterContext {
    pub fn new(event: BoxedEvent) -> Self {
        let text = event.text_or_empty().to_string();
        Self {
            event,
            text,
            cursor: 0,
            arguments: Arguments::new(),
        }
    }

    /// The event being evaluated.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// The full message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text not yet consumed by earlier filters.
    pub fn remaining(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Moves the cursor forward so that `remainder` is what is left.
    ///
    /// `remainder` must be a suffix of [`remaining`](Self::remaining), as
    /// returned by a cutter.
    pub fn advance_to_len(&mut self, remainder_len: usize) {
        let new_cursor = self.text.len().saturating_sub(remainder_len);
        if new_cursor >= self.cursor && self.text.is_char_boundary(new_cursor) {
            self.cursor = new_cursor;
        }
    }

    /// Binds a named argument for the reaction.
    pub fn bind(&mut self, name: impl Into<String>, value: ArgValue) {
        self.arguments.insert(name, value);
    }

    /// Arguments bound so far.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn into_arguments(self) -> Arguments {
        self.arguments
    }
}

impl fmt::Debug for FilterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterContext")
            .field("event", &self.event)
            .field("remaining", &self.remaining())
            .field("arguments", &self.arguments)
            .finish()
    }
}

// ============================================================================
// Filter Trait
// ============================================================================

/// A predicate over an event and the partially parsed message.
///
/// Filters may suspend, for example to look something up; the command waits
/// for each decision before moving on to the next filter.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Name recorded next to this filter's decision.
    fn name(&self) -> &str;

    /// Decides whether the event passes.
    ///
    /// Returning `Err` means the filter itself is broken, not that the event
    /// was rejected; rejection is `Ok` with a failed [`Decision`].
    async fn make_decision(&self, ctx: &mut FilterContext) -> FilterResult<Decision>;
}

/// A shareable filter.
pub type BoxedFilter = Arc<dyn Filter>;

// ============================================================================
// Built-in Filters
// ============================================================================

/// Matches a command prefix followed by one of the command names.
///
/// Every combination of prefix and name is accepted, case-insensitively, and
/// the name must end at a word boundary. On a pass the cursor moves past the
/// name, so argument filters see only what follows it.
#[derive(Debug, Clone)]
pub struct CommandNames {
    matcher: LiteralCutter,
}

impl CommandNames {
    pub fn new<P, N>(prefixes: P, names: N) -> ConfigResult<Self>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        if names.is_empty() {
            return Err(ConfigError::NoWords("command names"));
        }
        if names.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyAlias("command names"));
        }

        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        if prefixes.is_empty() {
            prefixes.push(String::new());
        }

        let words = prefixes
            .iter()
            .flat_map(|prefix| names.iter().map(move |name| format!("{prefix}{name}")));
        Ok(Self {
            matcher: LiteralCutter::new(words)?,
        })
    }

    /// Every accepted spelling, longest first.
    pub fn spellings(&self) -> &[String] {
        self.matcher.words()
    }
}

#[async_trait]
impl Filter for CommandNames {
    fn name(&self) -> &str {
        "command_names"
    }

    async fn make_decision(&self, ctx: &mut FilterContext) -> FilterResult<Decision> {
        match self.matcher.cut_part(ctx.remaining())? {
            Cut::Matched { value, remainder } => {
                let len = remainder.len();
                ctx.advance_to_len(len);
                Ok(Decision::pass(format!("invoked as '{value}'")))
            }
            Cut::Unmatched { .. } => Ok(Decision::fail(format!(
                "message does not start with {}",
                self.matcher.usage_description()
            ))),
        }
    }
}

/// Cuts one named argument from the remaining text.
///
/// Leading whitespace is skipped before the cutter runs. On a pass the value
/// is bound under the argument's name; on a failure the decision explains
/// the syntax the cutter expected.
#[derive(Clone)]
pub struct ArgumentFilter {
    name: String,
    cutter: BoxedCutter,
}

impl ArgumentFilter {
    pub fn new(name: impl Into<String>, cutter: BoxedCutter) -> Self {
        Self {
            name: name.into(),
            cutter,
        }
    }

    /// Syntax help for this argument.
    pub fn usage_description(&self) -> String {
        self.cutter.usage_description()
    }
}

impl fmt::Debug for ArgumentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Filter for ArgumentFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn make_decision(&self, ctx: &mut FilterContext) -> FilterResult<Decision> {
        let attempt = ctx.remaining().trim_start();
        match self.cutter.cut_value(attempt)? {
            Cut::Matched { value, remainder } => {
                let len = remainder.len();
                let description = format!("{} = {value}", self.name);
                ctx.advance_to_len(len);
                ctx.bind(self.name.clone(), value);
                Ok(Decision::pass(description))
            }
            Cut::Unmatched { .. } => Ok(Decision::fail(format!(
                "expected {}: {}",
                self.name,
                self.cutter.usage_description()
            ))),
        }
    }
}

/// Passes only if nothing but whitespace is left to parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndOfInput;

#[async_trait]
impl Filter for EndOfInput {
    fn name(&self) -> &str {
        "end_of_input"
    }

    async fn make_decision(&self, ctx: &mut FilterContext) -> FilterResult<Decision> {
        let rest = ctx.remaining().trim();
        if rest.is_empty() {
            Ok(Decision::pass("no trailing text"))
        } else {
            Ok(Decision::fail(format!("unexpected trailing text '{rest}'")))
        }
    }
}

type DecisionFn = Arc<dyn Fn(&FilterContext) -> Decision + Send + Sync>;

/// A synchronous filter from a closure.
#[derive(Clone)]
pub struct FnFilter {
    name: String,
    decide: DecisionFn,
}

impl FnFilter {
    /// Builds a filter whose closure returns the full decision.
    pub fn new<F>(name: impl Into<String>, decide: F) -> Self
    where
        F: Fn(&FilterContext) -> Decision + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            decide: Arc::new(decide),
        }
    }

    /// Builds a filter from a yes/no check on the event.
    pub fn predicate<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&BoxedEvent) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |ctx| {
            if check(ctx.event()) {
                Decision::pass("accepted")
            } else {
                Decision::fail("rejected")
            }
        })
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Filter for FnFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn make_decision(&self, ctx: &mut FilterContext) -> FilterResult<Decision> {
        Ok((self.decide)(&*ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutter::{IntegerCutter, ListConfig, ListCutter, boxed};
    use chisel_core::TextEvent;

    fn context(text: &str) -> FilterContext {
        FilterContext::new(BoxedEvent::new(TextEvent::message(text)))
    }

    #[tokio::test]
    async fn test_command_names_advance_cursor() {
        let filter = CommandNames::new(["/", "!"], ["sum", "add"]).unwrap();
        let mut ctx = context("!ADD 1 2");

        let decision = filter.make_decision(&mut ctx).await.unwrap();
        assert!(decision.passed);
        assert_eq!(ctx.remaining(), " 1 2");
    }

    #[tokio::test]
    async fn test_command_names_reject_longer_word() {
        let filter = CommandNames::new(["/"], ["sum"]).unwrap();
        let mut ctx = context("/summary");

        let decision = filter.make_decision(&mut ctx).await.unwrap();
        assert!(!decision.passed);
        assert_eq!(ctx.remaining(), "/summary");
    }

    #[test]
    fn test_command_names_without_prefixes() {
        let filter = CommandNames::new(Vec::<String>::new(), ["ping"]).unwrap();
        assert_eq!(filter.spellings(), ["ping".to_string()]);
    }

    #[tokio::test]
    async fn test_argument_filter_binds_and_advances() {
        let list = ListCutter::new(ListConfig::of(IntegerCutter::new()).max(5)).unwrap();
        let filter = ArgumentFilter::new("numbers", boxed(list));
        let mut ctx = context("  1 2 3 foo");

        let decision = filter.make_decision(&mut ctx).await.unwrap();
        assert!(decision.passed);
        assert_eq!(ctx.remaining(), " foo");
        assert_eq!(
            ctx.arguments().get_as::<Vec<i64>>("numbers").unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_argument_filter_failure_describes_syntax() {
        let filter = ArgumentFilter::new("count", boxed(IntegerCutter::new()));
        let mut ctx = context("many");

        let decision = filter.make_decision(&mut ctx).await.unwrap();
        assert!(!decision.passed);
        assert!(decision.description.contains(&filter.usage_description()));
        assert!(ctx.arguments().is_empty());
        assert_eq!(ctx.remaining(), "many");
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let mut done = context("  \n");
        let mut extra = context("x");

        assert!(EndOfInput.make_decision(&mut done).await.unwrap().passed);
        assert!(!EndOfInput.make_decision(&mut extra).await.unwrap().passed);
    }

    #[tokio::test]
    async fn test_fn_filter_predicate() {
        let filter = FnFilter::predicate("from_admin", |event| {
            event
                .downcast_ref::<TextEvent>()
                .is_some_and(|e| e.from_id == Some(1))
        });

        let mut admin = FilterContext::new(BoxedEvent::new(TextEvent::message("x").with_author(1)));
        let mut other = context("x");

        assert!(filter.make_decision(&mut admin).await.unwrap().passed);
        assert!(!filter.make_decision(&mut other).await.unwrap().passed);
    }
}

//! Commands: a filter chain bound to a reaction.
//!
//! Evaluating a [`Command`] against an event walks a small state machine:
//!
//! ```text
//! event type gate ──▶ filter[0] ──▶ filter[1] ──▶ ... ──▶ reaction ──▶ status
//!        │                │              │
//!        └── wrong type   └──────────────┴── first failure short-circuits
//! ```
//!
//! Whatever happens, the result is one [`HandlingStatus`]. Filter rejections
//! are recorded as decisions, reaction failures (errors and panics) as
//! exception text; neither escapes the command.
//!
//! # Tower Service Integration
//!
//! `Command` implements `tower::Service<BoxedEvent>`, so middleware can wrap
//! an evaluation:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .concurrency_limit(4)
//!     .service(command);
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, Level, debug, error, span, trace};

use chisel_core::{BoxedEvent, Decision, HandlingStatus, MESSAGE_NEW, StatusBuilder};

use crate::context::CommandContext;
use crate::cutter::{TextCutter, boxed};
use crate::error::{ConfigError, ConfigResult, ReactionError};
use crate::filter::{ArgumentFilter, BoxedFilter, CommandNames, EndOfInput, Filter, FilterContext};
use crate::reaction::{BoxedReaction, Reaction, into_reaction};

/// Internal data for a Command.
struct CommandInner {
    name: String,
    event_types: Vec<String>,
    filters: Vec<BoxedFilter>,
    arguments: Vec<(String, String)>,
    reaction: BoxedReaction,
}

/// A named filter chain plus the reaction it guards.
///
/// Commands are immutable once built and cheap to clone; every clone shares
/// the same filters and reaction.
#[derive(Clone)]
pub struct Command {
    inner: Arc<CommandInner>,
}

impl Command {
    /// Starts building a command called `name`.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Event types this command handles.
    pub fn event_types(&self) -> &[String] {
        &self.inner.event_types
    }

    /// Number of filters, argument filters included.
    pub fn filter_count(&self) -> usize {
        self.inner.filters.len()
    }

    /// Argument names with their syntax help, in declaration order.
    pub fn argument_usage(&self) -> &[(String, String)] {
        &self.inner.arguments
    }

    /// Returns `true` if events of this type are evaluated at all.
    pub fn accepts(&self, event_type: &str) -> bool {
        self.inner.event_types.iter().any(|t| t == event_type)
    }

    /// Evaluates this command against one event.
    ///
    /// Never fails: every outcome, including a failing or panicking
    /// reaction, ends up in the returned status.
    pub async fn handle_event(&self, event: BoxedEvent) -> HandlingStatus {
        let span = span!(Level::DEBUG, "command", name = %self.inner.name);
        self.evaluate(event).instrument(span).await
    }

    async fn evaluate(&self, event: BoxedEvent) -> HandlingStatus {
        let started = Instant::now();

        if !self.accepts(event.event_type()) {
            trace!(event_type = event.event_type(), "Event type not handled, skipping");
            return StatusBuilder::new(&self.inner.name)
                .wrong_event_type(event.event_type())
                .finish(started.elapsed());
        }

        let mut status = StatusBuilder::new(&self.inner.name);
        let mut ctx = FilterContext::new(event.clone());
        let mut passed = true;

        for filter in &self.inner.filters {
            match filter.make_decision(&mut ctx).await {
                Ok(decision) => {
                    let ok = decision.passed;
                    trace!(filter = filter.name(), passed = ok, "{}", decision.description);
                    status.record(decision, filter.name());
                    if !ok {
                        passed = false;
                        break;
                    }
                }
                Err(err) => {
                    error!(filter = filter.name(), error = %err, "Filter failed internally");
                    status.record(Decision::fail("internal error"), filter.name());
                    status.exception(format!("filter '{}' failed: {err}", filter.name()));
                    passed = false;
                    break;
                }
            }
        }

        let arguments = ctx.into_arguments();
        status.arguments(arguments.clone());

        if passed {
            debug!(arguments = arguments.len(), "Filters passed, running reaction");
            let ctx = CommandContext::new(self.inner.name.clone(), event, arguments);
            let outcome = AssertUnwindSafe((self.inner.reaction)(ctx))
                .catch_unwind()
                .await;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(panic) => Some(ReactionError::Panicked(panic_message(panic.as_ref()))),
            };
            if let Some(err) = failure {
                debug!(error = %err, "Reaction failed");
                status.exception(err.render());
            }
        }

        status.finish(started.elapsed())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.inner.name)
            .field("event_types", &self.inner.event_types)
            .field("filter_count", &self.inner.filters.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// Tower Service Implementation for Command
// ============================================================================

impl Service<BoxedEvent> for Command {
    type Response = HandlingStatus;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: BoxedEvent) -> Self::Future {
        let command = self.clone();
        Box::pin(async move { Ok(command.handle_event(event).await) })
    }
}

// ============================================================================
// Command Builder
// ============================================================================

enum Step {
    Filter(BoxedFilter),
    Argument(String, ArgumentFilter),
}

/// Builder for [`Command`].
///
/// The resulting chain is, in order: the name filter (if any names were
/// given), then every filter and argument in the order they were added, then
/// [`EndOfInput`] when the command is strict.
///
/// ```rust,ignore
/// let sum = Command::builder("sum")
///     .names(["sum", "add"])
///     .prefixes(["/", "!"])
///     .argument("numbers", ListCutter::new(ListConfig::of(FloatCutter::new()))?)
///     .strict(true)
///     .reaction(sum_reaction)
///     .build()?;
/// ```
pub struct CommandBuilder {
    name: String,
    names: Vec<String>,
    prefixes: Vec<String>,
    event_types: Option<Vec<String>>,
    steps: Vec<Step>,
    strict: bool,
    reaction: Option<BoxedReaction>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            prefixes: Vec::new(),
            event_types: None,
            steps: Vec::new(),
            strict: false,
            reaction: None,
        }
    }

    /// Words that invoke the command.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Prefixes accepted before a name, replacing earlier ones.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a custom filter.
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.steps.push(Step::Filter(Arc::new(filter)));
        self
    }

    /// Appends a named argument parsed by `cutter`.
    pub fn argument<C>(mut self, name: impl Into<String>, cutter: C) -> Self
    where
        C: TextCutter + 'static,
    {
        let name = name.into();
        let filter = ArgumentFilter::new(name.clone(), boxed(cutter));
        self.steps.push(Step::Argument(name, filter));
        self
    }

    /// Rejects messages with text left over after the last argument.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Adds an accepted event type. The first call replaces the default
    /// (`message_new`).
    pub fn on_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types
            .get_or_insert_with(Vec::new)
            .push(event_type.into());
        self
    }

    /// Sets the reaction run when every filter passes.
    pub fn reaction<F, T>(mut self, f: F) -> Self
    where
        F: Reaction<T>,
        T: 'static,
    {
        self.reaction = Some(into_reaction(f));
        self
    }

    /// Validates the configuration and freezes the command.
    pub fn build(self) -> ConfigResult<Command> {
        let reaction = self
            .reaction
            .ok_or_else(|| ConfigError::MissingReaction(self.name.clone()))?;

        let event_types = self
            .event_types
            .unwrap_or_else(|| vec![MESSAGE_NEW.to_string()]);
        if event_types.is_empty() {
            return Err(ConfigError::NoEventTypes(self.name));
        }

        let mut filters: Vec<BoxedFilter> = Vec::with_capacity(self.steps.len() + 2);
        if !self.names.is_empty() {
            filters.push(Arc::new(CommandNames::new(&self.prefixes, &self.names)?));
        }

        let mut seen = HashSet::new();
        let mut arguments = Vec::new();
        for step in self.steps {
            match step {
                Step::Filter(filter) => filters.push(filter),
                Step::Argument(name, filter) => {
                    if !seen.insert(name.clone()) {
                        return Err(ConfigError::DuplicateArgument {
                            command: self.name,
                            argument: name,
                        });
                    }
                    arguments.push((name, filter.usage_description()));
                    filters.push(Arc::new(filter));
                }
            }
        }

        if self.strict {
            filters.push(Arc::new(EndOfInput));
        }

        Ok(Command {
            inner: Arc::new(CommandInner {
                name: self.name,
                event_types,
                filters,
                arguments,
                reaction,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tower::ServiceExt;

    use super::*;
    use crate::cutter::{BoolConfig, BoolCutter, IntegerCutter, ListConfig, ListCutter, WordCutter};
    use crate::error::{FilterError, FilterResult};
    use crate::filter::FnFilter;
    use chisel_core::{ArgValue, MESSAGE_EDIT, TextEvent};

    fn message(text: &str) -> BoxedEvent {
        BoxedEvent::new(TextEvent::message(text))
    }

    async fn must_not_run() {
        panic!("must not run")
    }

    async fn explode() {
        panic!("exploded")
    }

    struct Broken;

    #[async_trait]
    impl Filter for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn make_decision(&self, _ctx: &mut FilterContext) -> FilterResult<Decision> {
            Err(FilterError::custom("lookup unavailable"))
        }
    }

    #[tokio::test]
    async fn test_list_scenario() {
        let command = Command::builder("list")
            .names(["list"])
            .argument(
                "items",
                ListCutter::new(ListConfig::of(IntegerCutter::new()).min(1).max(5)).unwrap(),
            )
            .reaction(|| async {})
            .build()
            .unwrap();

        let status = command.handle_event(message("list 1 2 3 foo")).await;

        assert!(status.all_filters_passed());
        assert_eq!(
            status.passed_arguments().get("items"),
            Some(&ArgValue::from(vec![1_i64, 2, 3]))
        );
        assert!(status.exception_text().is_none());
    }

    #[tokio::test]
    async fn test_short_circuit_keeps_earlier_bindings() {
        let later = Arc::new(AtomicUsize::new(0));
        let later_clone = Arc::clone(&later);

        let command = Command::builder("set")
            .names(["set"])
            .prefixes(["/"])
            .argument("key", WordCutter::new())
            .argument("enabled", BoolCutter::new(BoolConfig::new()).unwrap())
            .filter(FnFilter::new("counter", move |_| {
                later_clone.fetch_add(1, Ordering::SeqCst);
                Decision::pass("counted")
            }))
            .reaction(|| async {})
            .build()
            .unwrap();

        let status = command.handle_event(message("/set volume maybe")).await;

        assert!(!status.all_filters_passed());
        assert_eq!(status.filters_response().len(), 3);
        assert_eq!(status.failed_filter().unwrap().filter_name, "enabled");
        assert_eq!(status.passed_arguments().names().collect::<Vec<_>>(), vec!["key"]);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_event_type_runs_nothing() {
        let command = Command::builder("ping")
            .names(["ping"])
            .reaction(must_not_run)
            .build()
            .unwrap();

        let event = BoxedEvent::new(TextEvent::new(MESSAGE_EDIT).with_text("ping"));
        let status = command.handle_event(event).await;

        assert!(!status.is_correct_event_type());
        assert!(!status.all_filters_passed());
        assert_eq!(status.filters_response().len(), 1);
        let gate = status.failed_filter().unwrap();
        assert_eq!(gate.filter_name, StatusBuilder::EVENT_TYPE_GATE);
        assert_eq!(gate.decision.description, "event type 'message_edit' not handled");
        assert!(status.exception_text().is_none());
    }

    #[tokio::test]
    async fn test_all_filters_passed_tracks_responses() {
        let command = Command::builder("ping")
            .names(["ping"])
            .reaction(|| async {})
            .build()
            .unwrap();
        let edited = BoxedEvent::new(TextEvent::new(MESSAGE_EDIT).with_text("ping"));

        for event in [message("ping"), message("pong"), edited] {
            let status = command.handle_event(event).await;
            let every_passed = status.filters_response().iter().all(|r| r.decision.passed);
            assert_eq!(status.all_filters_passed(), every_passed);
        }
    }

    #[tokio::test]
    async fn test_reaction_error_is_recorded() {
        let command = Command::builder("fail")
            .names(["fail"])
            .reaction(|| async { Err::<(), _>("database is down") })
            .build()
            .unwrap();

        let status = command.handle_event(message("fail")).await;

        assert!(status.all_filters_passed());
        assert_eq!(status.exception_text(), Some("database is down"));
    }

    #[tokio::test]
    async fn test_reaction_panic_is_recorded() {
        let command = Command::builder("boom")
            .reaction(explode)
            .build()
            .unwrap();

        let status = command.handle_event(message("anything")).await;

        assert!(status.all_filters_passed());
        assert!(status.exception_text().unwrap().contains("exploded"));
    }

    #[tokio::test]
    async fn test_filter_error_is_internal_failure() {
        let command = Command::builder("lookup")
            .filter(Broken)
            .reaction(|| async {})
            .build()
            .unwrap();

        let status = command.handle_event(message("x")).await;

        assert!(!status.all_filters_passed());
        assert_eq!(status.failed_filter().unwrap().filter_name, "broken");
        assert!(status.exception_text().unwrap().contains("lookup unavailable"));
    }

    #[tokio::test]
    async fn test_strict_rejects_trailing_text() {
        let command = Command::builder("add")
            .names(["add"])
            .argument("a", IntegerCutter::new())
            .argument("b", IntegerCutter::new())
            .strict(true)
            .reaction(|| async {})
            .build()
            .unwrap();

        assert!(command.handle_event(message("add 1 2")).await.all_filters_passed());
        assert!(!command.handle_event(message("add 1 2 3")).await.all_filters_passed());
    }

    #[test]
    fn test_build_rejects_bad_configuration() {
        let missing = Command::builder("x").build().unwrap_err();
        assert_eq!(missing, ConfigError::MissingReaction("x".into()));

        let duplicate = Command::builder("x")
            .argument("n", IntegerCutter::new())
            .argument("n", IntegerCutter::new())
            .reaction(|| async {})
            .build()
            .unwrap_err();
        assert!(matches!(duplicate, ConfigError::DuplicateArgument { .. }));
    }

    #[test]
    fn test_service_oneshot() {
        let command = Command::builder("ping")
            .names(["ping"])
            .reaction(|| async {})
            .build()
            .unwrap();

        let status = tokio_test::block_on(command.oneshot(message("ping"))).unwrap();
        assert!(status.succeeded());
        assert_eq!(status.handler(), "ping");
    }
}

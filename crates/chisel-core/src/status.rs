//! The per-command outcome record.
//!
//! A [`HandlingStatus`] is produced fresh for every (event, command) pair.
//! It drives control flow (did the command fire?) and is handed unmodified
//! to reporters and signal handlers afterwards.
//!
//! Statuses are assembled through a [`StatusBuilder`] so that
//! `all_filters_passed` is always derived from the recorded decisions and
//! never set independently.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::value::Arguments;

/// The outcome of a single filter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the filter accepted the event.
    pub passed: bool,
    /// Human-readable explanation of the decision.
    pub description: String,
}

impl Decision {
    pub fn pass(description: impl Into<String>) -> Self {
        Self {
            passed: true,
            description: description.into(),
        }
    }

    pub fn fail(description: impl Into<String>) -> Self {
        Self {
            passed: false,
            description: description.into(),
        }
    }
}

/// A decision paired with the name of the filter that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResponse {
    pub decision: Decision,
    pub filter_name: String,
}

/// The immutable record of one command's evaluation for one event.
#[derive(Debug, Clone, Serialize)]
pub struct HandlingStatus {
    handler: String,
    is_correct_event_type: bool,
    filters_response: Vec<FilterResponse>,
    all_filters_passed: bool,
    passed_arguments: Arguments,
    #[serde(serialize_with = "serialize_secs")]
    taken_time: Duration,
    exception_text: Option<String>,
}

impl HandlingStatus {
    /// Name of the command that produced this record.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Whether the command handles this kind of event at all.
    pub fn is_correct_event_type(&self) -> bool {
        self.is_correct_event_type
    }

    /// Filter decisions in evaluation order.
    pub fn filters_response(&self) -> &[FilterResponse] {
        &self.filters_response
    }

    /// `true` iff every recorded decision passed.
    ///
    /// A rejected event type and an aborted evaluation each record a failing
    /// decision, so both read as `false` here.
    pub fn all_filters_passed(&self) -> bool {
        self.all_filters_passed
    }

    /// Arguments bound before the chain finished or short-circuited.
    pub fn passed_arguments(&self) -> &Arguments {
        &self.passed_arguments
    }

    /// Wall-clock duration of this command's evaluation.
    pub fn taken_time(&self) -> Duration {
        self.taken_time
    }

    /// Failure text captured from the reaction or the evaluation itself.
    pub fn exception_text(&self) -> Option<&str> {
        self.exception_text.as_deref()
    }

    /// `true` if the reaction ran and completed without failure.
    pub fn succeeded(&self) -> bool {
        self.all_filters_passed && self.exception_text.is_none()
    }

    /// Returns the first failing filter, if the chain short-circuited.
    pub fn failed_filter(&self) -> Option<&FilterResponse> {
        self.filters_response.iter().find(|r| !r.decision.passed)
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

// ============================================================================
// Status Builder
// ============================================================================

/// Accumulates the pieces of a [`HandlingStatus`] while a command runs.
#[derive(Debug)]
pub struct StatusBuilder {
    handler: String,
    is_correct_event_type: bool,
    filters_response: Vec<FilterResponse>,
    passed_arguments: Arguments,
    exception_text: Option<String>,
}

impl StatusBuilder {
    /// Starts a record for the command named `handler`.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            is_correct_event_type: true,
            filters_response: Vec::new(),
            passed_arguments: Arguments::new(),
            exception_text: None,
        }
    }

    /// Name recorded for the event-type gate decision.
    pub const EVENT_TYPE_GATE: &'static str = "event_type";

    /// Name recorded for a failure outside the filter chain.
    pub const INTERNAL: &'static str = "internal";

    /// Marks `event_type` as one the command does not handle.
    pub fn wrong_event_type(mut self, event_type: &str) -> Self {
        self.is_correct_event_type = false;
        self.record(
            Decision::fail(format!("event type '{event_type}' not handled")),
            Self::EVENT_TYPE_GATE,
        );
        self
    }

    /// Appends one filter decision.
    pub fn record(&mut self, decision: Decision, filter_name: impl Into<String>) {
        self.filters_response.push(FilterResponse {
            decision,
            filter_name: filter_name.into(),
        });
    }

    /// Sets the arguments bound so far.
    pub fn arguments(&mut self, arguments: Arguments) {
        self.passed_arguments = arguments;
    }

    /// Records a reaction failure. The filter outcome is left untouched.
    pub fn exception(&mut self, text: impl Into<String>) {
        self.exception_text = Some(text.into());
    }

    /// Records a failure that prevented the chain from completing.
    pub fn internal_failure(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.record(Decision::fail(text.clone()), Self::INTERNAL);
        self.exception_text = Some(text);
        self
    }

    /// Freezes the record.
    pub fn finish(self, taken_time: Duration) -> HandlingStatus {
        let all_filters_passed = self.filters_response.iter().all(|r| r.decision.passed);

        HandlingStatus {
            handler: self.handler,
            is_correct_event_type: self.is_correct_event_type,
            filters_response: self.filters_response,
            all_filters_passed,
            passed_arguments: self.passed_arguments,
            taken_time,
            exception_text: self.exception_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArgValue;

    #[test]
    fn test_all_filters_passed_is_derived() {
        let mut builder = StatusBuilder::new("sum");
        builder.record(Decision::pass("ok"), "names");
        builder.record(Decision::fail("expected a number"), "numbers");
        let status = builder.finish(Duration::from_millis(3));

        assert!(!status.all_filters_passed());
        assert_eq!(status.failed_filter().unwrap().filter_name, "numbers");
        assert!(!status.succeeded());
    }

    fn every_response_passed(status: &HandlingStatus) -> bool {
        status.filters_response().iter().all(|r| r.decision.passed)
    }

    #[test]
    fn test_wrong_event_type_never_passes() {
        let status = StatusBuilder::new("sum")
            .wrong_event_type("message_edit")
            .finish(Duration::ZERO);

        assert!(!status.is_correct_event_type());
        assert!(!status.all_filters_passed());
        assert_eq!(status.all_filters_passed(), every_response_passed(&status));

        let gate = status.failed_filter().unwrap();
        assert_eq!(gate.filter_name, StatusBuilder::EVENT_TYPE_GATE);
        assert_eq!(gate.decision.description, "event type 'message_edit' not handled");
    }

    #[test]
    fn test_internal_failure_marks_chain_incomplete() {
        let mut builder = StatusBuilder::new("sum");
        builder.record(Decision::pass("ok"), "names");
        let status = builder
            .internal_failure("unit panicked")
            .finish(Duration::ZERO);

        assert!(!status.all_filters_passed());
        assert_eq!(status.all_filters_passed(), every_response_passed(&status));
        assert_eq!(status.failed_filter().unwrap().filter_name, StatusBuilder::INTERNAL);
        assert_eq!(status.exception_text(), Some("unit panicked"));
    }

    #[test]
    fn test_flag_matches_recorded_decisions() {
        let mut passing = StatusBuilder::new("ping");
        passing.record(Decision::pass("matched"), "names");
        let passing = passing.finish(Duration::ZERO);

        let empty = StatusBuilder::new("ping").finish(Duration::ZERO);

        for status in [&passing, &empty] {
            assert!(status.all_filters_passed());
            assert_eq!(status.all_filters_passed(), every_response_passed(status));
        }
    }

    #[test]
    fn test_reaction_failure_keeps_filter_outcome() {
        let mut builder = StatusBuilder::new("echo");
        builder.record(Decision::pass("ok"), "names");
        builder.arguments([("text", ArgValue::from("hi"))].into_iter().collect());
        builder.exception("boom");
        let status = builder.finish(Duration::ZERO);

        assert!(status.all_filters_passed());
        assert!(!status.succeeded());
        assert_eq!(status.passed_arguments().len(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut builder = StatusBuilder::new("ping");
        builder.record(Decision::pass("matched"), "names");
        let status = builder.finish(Duration::from_millis(1500));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["handler"], "ping");
        assert_eq!(json["all_filters_passed"], true);
        assert_eq!(json["taken_time"], 1.5);
        assert_eq!(json["filters_response"][0]["filter_name"], "names");
    }
}

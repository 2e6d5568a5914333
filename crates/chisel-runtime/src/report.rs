//! Reporting of handling outcomes.
//!
//! After every event the bot hands the full status list to a [`Reporter`].
//! Outside release mode this is a [`TracingReporter`]; in release mode only
//! failures reach the [`FailureReporter`].

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{error, info};

use chisel_core::{BoxedEvent, HandlingStatus};

/// Receives the outcome of one event's dispatch.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]);
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
        (**self).report(event, statuses)
    }
}

/// Renders one status as a multi-line block.
///
/// ```text
/// sum [passed] in 0.000120s
///   command_names: passed (invoked as '/sum')
///   numbers: passed (numbers = [1, 2])
///   arguments: numbers=[1, 2]
/// ```
pub fn render_status(status: &HandlingStatus) -> String {
    let verdict = if status.all_filters_passed() {
        "passed"
    } else {
        "rejected"
    };
    let mut out = format!(
        "{} [{verdict}] in {:.6}s",
        status.handler(),
        status.taken_time().as_secs_f64()
    );

    for response in status.filters_response() {
        let outcome = if response.decision.passed {
            "passed"
        } else {
            "failed"
        };
        let _ = write!(
            out,
            "\n  {}: {outcome} ({})",
            response.filter_name, response.decision.description
        );
    }

    if !status.passed_arguments().is_empty() {
        let bound = status
            .passed_arguments()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "\n  arguments: {bound}");
    }

    if let Some(text) = status.exception_text() {
        let _ = write!(out, "\n  failure: {text}");
    }

    out
}

/// Logs every status for the accepted event type, passed ones first.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
        let relevant = || statuses.iter().filter(|s| s.is_correct_event_type());
        let passed = relevant().filter(|s| s.all_filters_passed());
        let failed = relevant().filter(|s| !s.all_filters_passed());

        for status in passed.chain(failed) {
            info!(
                event_type = event.event_type(),
                handler = status.handler(),
                "{}",
                render_status(status)
            );
        }
    }
}

/// Logs only statuses that carry failure text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailureReporter;

impl Reporter for FailureReporter {
    fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
        for status in statuses.iter().filter(|s| s.exception_text().is_some()) {
            error!(
                event_type = event.event_type(),
                handler = status.handler(),
                "{}",
                render_status(status)
            );
        }
    }
}

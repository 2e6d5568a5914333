//! Concurrent fan-out of one event to every registered command.
//!
//! Every command is evaluated as its own tokio task, so a slow filter or a
//! hung reaction only holds up its own unit. The batch waits for all units
//! (a join barrier) and returns the statuses in registry order, however the
//! tasks happened to finish. Units live in a [`JoinSet`]: dropping the batch
//! future aborts whatever is still running.
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add(sum_command);
//! dispatcher.add(echo_command);
//!
//! let statuses = dispatcher.dispatch(event).await;
//! assert_eq!(statuses[0].handler(), "sum");
//! ```

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tracing::{Instrument, Level, error, span, trace};

use chisel_core::{BoxedEvent, HandlingStatus, StatusBuilder};

use crate::command::{Command, panic_message};

/// Evaluates `event` against every command concurrently.
///
/// Returns exactly one status per command, in the order of `commands`. A
/// unit that fails outside its reaction (for example a panicking filter) is
/// logged and reported as a status carrying the failure text; the other
/// units are unaffected.
///
/// Must be called from within a tokio runtime.
pub async fn dispatch(event: BoxedEvent, commands: &[Command]) -> Vec<HandlingStatus> {
    let span = span!(
        Level::DEBUG,
        "dispatch",
        event_type = %event.event_type(),
        commands = commands.len()
    );

    async move {
        let started = Instant::now();

        let mut units = JoinSet::new();
        for (index, command) in commands.iter().enumerate() {
            let unit = command.clone().oneshot(event.clone());
            units.spawn(
                async move { (index, AssertUnwindSafe(unit).catch_unwind().await) }
                    .in_current_span(),
            );
        }

        let mut slots: Vec<Option<HandlingStatus>> = vec![None; commands.len()];
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok((index, Ok(Ok(status)))) => slots[index] = Some(status),
                Ok((_, Ok(Err(never)))) => match never {},
                Ok((index, Err(panic))) => {
                    let command = &commands[index];
                    let reason = panic_message(panic.as_ref());
                    error!(
                        command = command.name(),
                        error = %reason,
                        "Command evaluation failed outside its reaction"
                    );
                    slots[index] = Some(internal_failure(command, &reason, started.elapsed()));
                }
                // Only reachable if the runtime cancels a unit; the slot is
                // filled below.
                Err(err) => error!(error = %err, "Command unit did not complete"),
            }
        }

        trace!(elapsed = ?started.elapsed(), "Dispatch batch joined");

        commands
            .iter()
            .zip(slots)
            .map(|(command, slot)| {
                slot.unwrap_or_else(|| {
                    internal_failure(command, "unit did not complete", started.elapsed())
                })
            })
            .collect()
    }
    .instrument(span)
    .await
}

fn internal_failure(command: &Command, reason: &str, taken: Duration) -> HandlingStatus {
    StatusBuilder::new(command.name())
        .internal_failure(format!("internal failure: {reason}"))
        .finish(taken)
}

// ============================================================================
// Dispatcher
// ============================================================================

/// An ordered command registry that dispatches events to its commands.
///
/// The registry is only mutated through `&mut self`, so it cannot change
/// while a batch borrowing it is running.
#[derive(Default, Clone)]
pub struct Dispatcher {
    commands: Vec<Command>,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command after the existing ones.
    pub fn add(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Registers a command (builder pattern).
    pub fn with(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Removes every command called `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.commands.len();
        self.commands.retain(|c| c.name() != name);
        before - self.commands.len()
    }

    /// Registered commands in dispatch order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Clears all registered commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Dispatches an event to every registered command.
    pub async fn dispatch(&self, event: BoxedEvent) -> Vec<HandlingStatus> {
        dispatch(event, &self.commands).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("command_count", &self.commands.len())
            .finish()
    }
}

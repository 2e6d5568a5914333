//! The context handed to a reaction once every filter has passed.

use chisel_core::{Arguments, BoxedEvent, FromArgValue};

use crate::error::ExtractResult;

/// Everything a reaction can see about the evaluation that fired it.
///
/// Each reaction gets its own context. The event inside is a shared,
/// read-only snapshot, and the arguments are the ones bound by this
/// command's filters only.
#[derive(Debug, Clone)]
pub struct CommandContext {
    command: String,
    event: BoxedEvent,
    arguments: Arguments,
}

impl CommandContext {
    pub fn new(command: impl Into<String>, event: BoxedEvent, arguments: Arguments) -> Self {
        Self {
            command: command.into(),
            event,
            arguments,
        }
    }

    /// Name of the command being run.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The event that triggered the command.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// All bound arguments, in declaration order.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Reads one bound argument as `T`.
    ///
    /// ```rust,ignore
    /// async fn sum(ctx: CommandContext) -> Result<(), ReactionError> {
    ///     let numbers: Vec<f64> = ctx.arg("numbers")?;
    ///     println!("{}", numbers.iter().sum::<f64>());
    ///     Ok(())
    /// }
    /// ```
    pub fn arg<T: FromArgValue>(&self, name: &str) -> ExtractResult<T> {
        Ok(self.arguments.get_as(name)?)
    }
}

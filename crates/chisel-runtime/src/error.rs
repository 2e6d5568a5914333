//! Runtime error types.

use thiserror::Error;

use chisel_framework::BoxError;

use crate::config::ConfigLoadError;

/// Errors that can occur while building or running a bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The event source failed to produce a batch.
    #[error("Event source error: {0}")]
    Source(#[source] BoxError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    /// A command definition was rejected.
    #[error("Invalid command: {0}")]
    Command(#[from] chisel_framework::ConfigError),

    /// `run` was called while the bot is already running.
    #[error("Bot is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

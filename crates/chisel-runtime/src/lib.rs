//! Chisel Runtime - the bot loop around the command engine.
//!
//! This crate provides:
//! - The [`Bot`] event loop over an [`EventSource`]
//! - Figment-based configuration (`chisel.toml`, `CHISEL_*` variables)
//! - Logging setup on `tracing-subscriber`
//! - Reporting of handling outcomes and named lifecycle signals
//!
//! ```ignore
//! use chisel_runtime::{Bot, config::load_config, logging, source};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let bot = Bot::from_config(&config).build();
//!     bot.add_command(bot.command("ping").reaction(|| async {}).build()?);
//!
//!     let (tx, events) = source::channel(64);
//!     // feed `tx` from your transport
//!     bot.run(events).await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod signal;
pub mod source;

// Re-exports
pub use bot::{Bot, BotBuilder, BotHandle, DebugFilter, shutdown_signal};
pub use config::{
    BotSettings, ChiselConfig, ConfigLoadError, ConfigLoadResult, ConfigLoader, LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use report::{FailureReporter, Reporter, TracingReporter, render_status};
pub use signal::{NoSignals, ReservedSignal, SignalDispatcher, SignalHub, SignalPayload};
pub use source::{ChannelSource, EventSource};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for bot code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

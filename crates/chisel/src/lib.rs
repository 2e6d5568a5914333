//! # Chisel
//!
//! A command dispatch and argument-cutting engine for chat bots.
//!
//! ## Architecture
//!
//! Every incoming event is offered to every registered command at once.
//! Each command runs its own filter chain in its own task and produces one
//! [`HandlingStatus`](chisel_core::HandlingStatus):
//!
//! ```text
//!                     ┌──▶ Command "sum"  : names ─▶ numbers ─▶ reaction ──▶ status
//! ┌──────┐  event  ┌──┴───────┐
//! │ Bot  │────────▶│ dispatch │──▶ Command "echo" : names ─▶ text ─▶ reaction ──▶ status
//! └──────┘         └──┬───────┘
//!                     └──▶ Command ...                                       ──▶ status
//! ```
//!
//! - **Cutters** consume typed values from the front of the message text
//! - **Filters** make one pass/fail decision each and short-circuit on failure
//! - **Reactions** are async functions whose parameters are extracted from
//!   the command context
//! - **Statuses** come back in registration order, whatever order the
//!   commands finished in
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chisel::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let bot = Bot::from_config(&config).build();
//!     bot.add_command(
//!         bot.command("sum")
//!             .argument("numbers", ListCutter::new(ListConfig::of(FloatCutter::new()))?)
//!             .reaction(|ctx: CommandContext| async move {
//!                 let numbers: Vec<f64> = ctx.arg("numbers")?;
//!                 info!("sum = {}", numbers.iter().sum::<f64>());
//!                 Ok::<(), ReactionError>(())
//!             })
//!             .build()?,
//!     );
//!
//!     let (tx, events) = channel(64);
//!     bot.run(events).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: read `chisel.toml`
//! - `yaml-config`: read `chisel.yaml`
//! - `json-log`: JSON log output

pub use chisel_core as core;
pub use chisel_framework as framework;
pub use chisel_runtime as runtime;

pub use chisel_core::{
    ArgValue, Arguments, BoxedEvent, Decision, Event, EventContext, HandlingStatus, TextEvent,
};
pub use chisel_framework::{Command, CommandBuilder, CommandContext, Dispatcher, dispatch};
pub use chisel_runtime::{Bot, BotHandle, ChiselConfig};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chisel::prelude::*;
/// ```
pub mod prelude {
    // Bot loop and configuration
    pub use chisel_runtime::config::{ConfigLoader, load_config};
    pub use chisel_runtime::logging;
    pub use chisel_runtime::source::channel;
    pub use chisel_runtime::{
        Bot, BotHandle, ChannelSource, EventSource, Reporter, SignalHub, SignalPayload,
        shutdown_signal,
    };

    // Commands and filters
    pub use chisel_framework::{
        Command, CommandBuilder, CommandContext, Dispatcher, Filter, FilterContext, FnFilter,
        ReactionError, dispatch,
    };

    // Cutters
    pub use chisel_framework::{
        BoolConfig, BoolCutter, FloatCutter, IntegerCutter, ListConfig, ListCutter, LiteralCutter,
        PatternCutter, StringCutter, TextCutter, WordCutter,
    };

    // Events and outcomes
    pub use chisel_core::{
        ArgValue, Arguments, BoxedEvent, Decision, Event, EventContext, HandlingStatus, TextEvent,
    };

    // Logging macros
    pub use chisel_runtime::prelude::*;
}

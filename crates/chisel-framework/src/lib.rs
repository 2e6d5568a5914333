//! # Chisel Framework
//!
//! The command engine: everything between "an event arrived" and "here is
//! what each command did with it".
//!
//! This layer provides:
//! - Text cutters that parse typed arguments from the front of a message
//! - Filters that decide whether a command fires
//! - Commands binding a filter chain to an Axum-style reaction
//! - A dispatcher that evaluates every command concurrently and collects one
//!   [`HandlingStatus`](chisel_core::HandlingStatus) per command

pub mod command;
pub mod context;
pub mod cutter;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod reaction;

pub use command::{Command, CommandBuilder};
pub use context::CommandContext;
pub use cutter::{
    BoolConfig, BoolCutter, BoxedCutter, Cut, CutResult, ErasedCutter, FloatCutter, IntegerCutter,
    ListConfig, ListCutter, LiteralCutter, PatternCutter, StringCutter, TextCutter, WordCutter,
};
pub use dispatcher::{Dispatcher, dispatch};
pub use error::{
    BoxError, ConfigError, ConfigResult, CutterError, ExtractError, ExtractResult, FilterError,
    FilterResult, ReactionError, ReactionResult,
};
pub use extractor::FromContext;
pub use filter::{
    ArgumentFilter, BoxedFilter, CommandNames, EndOfInput, Filter, FilterContext, FnFilter,
};
pub use reaction::{BoxedReaction, IntoReactionResult, Reaction, into_reaction};

//! Configuration for the Chisel runtime.
//!
//! Settings are layered with figment: defaults, config files, then
//! `CHISEL_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigLoadError, ConfigLoadResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file, release_flag};
pub use schema::{
    BotSettings, ChiselConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;

//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use chisel_core::{MESSAGE_EDIT, MESSAGE_NEW};

/// Root configuration structure.
///
/// ```toml
/// [bot]
/// release = false
/// prefixes = ["/", "!"]
/// debug_event_types = ["message_new", "message_edit"]
///
/// [logging]
/// level = "debug"
/// format = "pretty"
///
/// [logging.filters]
/// chisel_framework = "trace"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChiselConfig {
    /// Bot behaviour.
    #[serde(default)]
    pub bot: BotSettings,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the bot loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotSettings {
    /// In release mode only reaction failures are reported.
    #[serde(default)]
    pub release: bool,

    /// Event types whose handling is reported outside release mode.
    #[serde(default = "default_debug_event_types")]
    pub debug_event_types: Vec<String>,

    /// Prefixes given to commands created through the bot.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            release: false,
            debug_event_types: default_debug_event_types(),
            prefixes: default_prefixes(),
        }
    }
}

fn default_debug_event_types() -> Vec<String> {
    vec![MESSAGE_NEW.to_string(), MESSAGE_EDIT.to_string()]
}

fn default_prefixes() -> Vec<String> {
    vec!["/".to_string()]
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output layout of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON; requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in each line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-target levels, e.g. `chisel_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

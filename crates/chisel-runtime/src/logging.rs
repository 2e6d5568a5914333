//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Dispatch and command handling run inside `dispatch` and `command` spans,
//! so closing-span events show how long each command took for an event.
//!
//! ```rust,ignore
//! use chisel_runtime::config::load_config;
//! use chisel_runtime::logging::{self, LoggingBuilder};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! // or, while debugging a filter chain:
//! LoggingBuilder::from_config(&config.logging).trace_commands().init();
//! ```

use std::ffi::OsStr;
use std::path::Path;

use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

/// Initializes logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

fn fmt_span(events: &SpanEventConfig) -> FmtSpan {
    [
        (events.new, FmtSpan::NEW),
        (events.enter, FmtSpan::ENTER),
        (events.exit, FmtSpan::EXIT),
        (events.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
}

/// Builds the global subscriber from a [`LoggingConfig`] plus extra
/// directives.
#[derive(Debug)]
pub struct LoggingBuilder {
    config: LoggingConfig,
    directives: Vec<String>,
}

impl LoggingBuilder {
    pub fn from_config(config: &LoggingConfig) -> Self {
        // Sorted so the resulting filter does not depend on map order.
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));
        let directives = filters
            .into_iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect();

        Self {
            config: config.clone(),
            directives,
        }
    }

    /// Adds a filter directive such as `chisel_framework=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Logs every filter decision and the timing of each command span.
    pub fn trace_commands(mut self) -> Self {
        self.config.span_events.new = true;
        self.config.span_events.close = true;
        self.directive("chisel_framework=trace")
    }

    /// Directive strings in the order they are applied.
    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    /// `RUST_LOG` wins over the configured level; directives are added on top.
    fn build_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()));

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => warn!(directive = %directive, error = %err, "Ignoring log directive"),
            }
        }

        filter
    }

    fn make_writer(&self) -> BoxMakeWriter {
        let path = match (self.config.output, &self.config.file_path) {
            (LogOutput::Stdout, _) => return BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => return BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => path,
            (LogOutput::File, None) => {
                warn!("File output requested but no file path configured, falling back to stdout");
                return BoxMakeWriter::new(std::io::stdout);
            }
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file = path.file_name().unwrap_or_else(|| OsStr::new("chisel.log"));
        let appender = match self.config.rotation {
            LogRotation::Never => tracing_appender::rolling::never(dir, file),
            LogRotation::Hourly => tracing_appender::rolling::hourly(dir, file),
            LogRotation::Daily => tracing_appender::rolling::daily(dir, file),
        };
        BoxMakeWriter::new(appender)
    }

    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, failing if one is already set.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let writer = self.make_writer();
        let span_events = fmt_span(&self.config.span_events);
        let thread_ids = self.config.thread_ids;
        let location = self.config.file_location;

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events)
                    .with_thread_ids(thread_ids)
                    .with_file(location)
                    .with_line_number(location)
                    .with_writer(writer)
            };
        }

        let registry = tracing_subscriber::registry().with(filter);
        match self.config.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => registry
                .with(configure_layer!(fmt::layer().json()))
                .try_init(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                let result = registry
                    .with(configure_layer!(fmt::layer().compact()))
                    .try_init();
                warn!("JSON logging needs the json-log feature, using compact output");
                result
            }
            LogFormat::Compact => registry
                .with(configure_layer!(fmt::layer().compact()))
                .try_init(),
            LogFormat::Full => registry.with(configure_layer!(fmt::layer())).try_init(),
            LogFormat::Pretty => registry
                .with(configure_layer!(fmt::layer().pretty()))
                .try_init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_span_event_flags() {
        assert_eq!(fmt_span(&SpanEventConfig::default()), FmtSpan::NONE);

        let lifecycle = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        assert_eq!(fmt_span(&lifecycle), FmtSpan::NEW | FmtSpan::CLOSE);
    }

    #[test]
    fn test_builder_sorts_config_filters() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            ..Default::default()
        };
        config
            .filters
            .insert("chisel_runtime".to_string(), LogLevel::Warn);
        config
            .filters
            .insert("chisel_framework".to_string(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);

        assert_eq!(
            builder.directives(),
            ["chisel_framework=trace", "chisel_runtime=warn"]
        );
    }

    #[test]
    fn test_trace_commands_enables_command_timing() {
        let builder = LoggingBuilder::from_config(&LoggingConfig::default()).trace_commands();

        assert_eq!(builder.directives(), ["chisel_framework=trace"]);
        assert_eq!(
            fmt_span(&builder.config.span_events),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }
}

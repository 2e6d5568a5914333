//! Configuration validation utilities.

use super::error::{ConfigLoadError, ConfigLoadResult};
use super::schema::{BotSettings, ChiselConfig, LogFormat, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ChiselConfig) -> ConfigLoadResult<()> {
    validate_bot_settings(&config.bot)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_bot_settings(bot: &BotSettings) -> ConfigLoadResult<()> {
    if bot.prefixes.is_empty() {
        return Err(ConfigLoadError::validation(
            "bot.prefixes must contain at least one prefix (use \"\" for none)",
        ));
    }

    if bot.debug_event_types.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigLoadError::validation(
            "bot.debug_event_types cannot contain empty event types",
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigLoadResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigLoadError::missing_field("logging.file_path"));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigLoadError::validation(
            "logging.format = \"json\" requires the json-log feature",
        ));
    }

    if let Some(target) = logging.filters.keys().find(|k| k.trim().is_empty()) {
        return Err(ConfigLoadError::validation(format!(
            "Invalid logging filter target: '{target}'"
        )));
    }

    Ok(())
}

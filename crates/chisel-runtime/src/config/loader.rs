//! Configuration loader using figment.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`chisel.{profile}.toml` / `chisel.{profile}.yaml`)
//! 4. Main config file (`chisel.toml` / `chisel.yaml`)
//! 5. Environment variables (`CHISEL_*`)
//! 6. The `CHISEL_RELEASE` switch
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`chisel.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`chisel.yaml`, `chisel.yml`, ...)
//!
//! # Environment Variable Mapping
//!
//! Nested keys are separated by `__`:
//!
//! - `CHISEL_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `CHISEL_BOT__RELEASE=true` → `bot.release = true`
//!
//! `CHISEL_RELEASE` is honoured on its own: any non-empty value other than
//! `0` or `false` turns release mode on.
//!
//! # Example
//!
//! ```rust,ignore
//! use chisel_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigLoadError, ConfigLoadResult};
use super::schema::ChiselConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "CHISEL_";
const PROFILE_VAR: &str = "CHISEL_PROFILE";
const RELEASE_VAR: &str = "CHISEL_RELEASE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the `dev` and `prod` short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Custom(name.to_string()),
        }
    }

    /// Reads `CHISEL_PROFILE`, falling back to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interprets the value of the release switch.
pub fn release_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load, skipping the search.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values programmatically.
    pub fn merge(mut self, config: ChiselConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigLoadResult<ChiselConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ChiselConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            release = config.bot.release,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigLoadResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ChiselConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigLoadError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["PROFILE", "RELEASE"])
                    .split("__"),
            );

            let release = std::env::var(RELEASE_VAR).ok();
            if release_flag(release.as_deref()) {
                figment = figment.merge(Serialized::default("bot.release", true));
            }
        }

        Ok(figment)
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigLoadResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigLoadError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chisel"));
        }
        paths
    }

    /// Tries `{stem}.{profile}.{ext}` then `{stem}.{ext}` for every search
    /// path; stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut, unused_variables)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["chisel.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["chisel.yaml", "chisel.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigLoadResult<ChiselConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigLoadResult<ChiselConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    fn empty_dir() -> PathBuf {
        std::env::temp_dir().join("chisel-config-test-missing")
    }

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert!(!config.bot.release);
        assert_eq!(config.bot.prefixes, vec!["/".to_string()]);
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut overrides = ChiselConfig::default();
        overrides.bot.release = true;
        overrides.logging.level = LogLevel::Debug;

        let config = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .merge(overrides)
            .load()
            .unwrap();

        assert!(config.bot.release);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_merge_is_validated() {
        let mut overrides = ChiselConfig::default();
        overrides.bot.prefixes.clear();

        let result = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .merge(overrides)
            .load();

        assert!(matches!(
            result,
            Err(ConfigLoadError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .without_env()
            .file(empty_dir().join("chisel.toml"))
            .load();

        assert!(matches!(result, Err(ConfigLoadError::FileNotFound(_))));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("Development"), Profile::Development);
        assert_eq!(
            Profile::parse("staging"),
            Profile::Custom("staging".to_string())
        );
    }

    #[test]
    fn test_release_flag() {
        assert!(!release_flag(None));
        assert!(!release_flag(Some("")));
        assert!(!release_flag(Some("0")));
        assert!(!release_flag(Some("FALSE")));
        assert!(release_flag(Some("1")));
        assert!(release_flag(Some("yes")));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_with_profile() {
        let dir = std::env::temp_dir().join(format!("chisel-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("chisel.toml"),
            "[bot]\nprefixes = [\"!\"]\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("chisel.production.toml"),
            "[bot]\nrelease = true\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .profile("production")
            .search_path(&dir)
            .load()
            .unwrap();

        assert!(config.bot.release);
        assert_eq!(config.bot.prefixes, vec!["!".to_string()]);
        assert_eq!(config.logging.level, LogLevel::Warn);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

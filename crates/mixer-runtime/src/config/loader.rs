//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML files (`mixer.toml`, `config.toml`)
//! - `yaml-config`: enables YAML files (`mixer.yaml`, `mixer.yml`)
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic settings ([`ConfigLoader::merge`])
//! 3. Profile-specific config file (`mixer.{profile}.toml`)
//! 4. Main config file (`mixer.toml`)
//! 5. Environment variables (`MIXER_*`, `__` as separator)
//!
//! - `MIXER_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `MIXER_ROUTING__TIMEOUT_MS=500` → `routing.timeout_ms = 500`
//!
//! # Example
//!
//! ```rust,ignore
//! use mixer_runtime::config::ConfigLoader;
//!
//! let settings = ConfigLoader::new()
//!     .file("./config/mixer.toml")
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

use super::error::{ConfigError, ConfigResult};
use super::schema::MixerSettings;
use super::validation::validate_config;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "MIXER_";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the short forms `dev` and `prod`.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `MIXER_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var("MIXER_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
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
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings programmatically.
    ///
    /// These replace the built-in defaults; config files and environment
    /// variables still take precedence over them.
    pub fn merge(mut self, settings: MixerSettings) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(settings));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<MixerSettings> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let settings: MixerSettings = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;
        validate_config(&settings)?;

        debug!(
            profile = %profile,
            logging_level = %settings.logging.level,
            timeout_ms = ?settings.routing.timeout_ms,
            "Configuration loaded successfully"
        );

        Ok(settings)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(MixerSettings::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => {
                let _ = figment;
                Err(ConfigError::ParseError(format!(
                    "Unsupported or disabled configuration file format: .{ext}"
                )))
            }
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
            paths.push(config_dir.join("mixer"));
        }
        paths
    }

    /// Tries `search_paths × base_names`, merging a profile-specific file
    /// before the base file. Stops at the first base file found.
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
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_mut)
    )]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["mixer.toml", "config.toml"],
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
                &["mixer.yaml", "mixer.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, RoutingConfig};

    fn empty_dir() -> PathBuf {
        std::env::temp_dir().join("mixer-config-loader-empty")
    }

    #[test]
    fn test_default_config() {
        let settings = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .load()
            .unwrap();

        assert_eq!(settings.logging.level, LogLevel::Info);
        assert_eq!(settings.routing.timeout_ms, None);
        assert_eq!(settings.routing.concurrency, 16);
    }

    #[test]
    fn test_programmatic_override() {
        let settings = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .merge(MixerSettings {
                routing: RoutingConfig {
                    timeout_ms: Some(250),
                    diagnostics: true,
                    concurrency: 4,
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(settings.routing.timeout_ms, Some(250));
        assert!(settings.routing.diagnostics);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = ConfigLoader::new()
            .without_env()
            .search_path(empty_dir())
            .merge(MixerSettings {
                routing: RoutingConfig {
                    concurrency: 0,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load();

        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_wins_over_programmatic_settings() {
        let dir = std::env::temp_dir().join("mixer-config-loader-layering");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mixer.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let settings = ConfigLoader::new()
            .without_env()
            .file(&path)
            .merge(MixerSettings {
                routing: RoutingConfig {
                    timeout_ms: Some(250),
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.routing.timeout_ms, Some(250));
        assert_eq!(settings.routing.concurrency, 16);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .without_env()
            .file(empty_dir().join("absent.toml"))
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("Dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").to_string(), "staging");
    }
}

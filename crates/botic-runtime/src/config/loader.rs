//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `botic.toml`
//! - `yaml-config`: enables `botic.yaml` / `botic.yml`
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (explicit, or the first `botic.*` found in the search paths)
//! 3. Environment variables (`BOTIC_*`)
//! 4. Programmatic overrides passed to [`ConfigLoader::merge`]
//!
//! # Environment Variable Mapping
//!
//! Variables use the `BOTIC_` prefix with `__` as the nesting separator:
//!
//! - `BOTIC_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BOTIC_ROUTER__HELP_COMMAND=usage` → `router.help_command = "usage"`
//!
//! ```rust,ignore
//! use botic_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/botic.toml")
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
use super::schema::BoticConfig;
use super::validation::validate_config;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BOTIC_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Programmatic overrides, applied last.
    overrides: Vec<BoticConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader searching the current and user config directories.
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            config_file: None,
            load_env: true,
            overrides: Vec::new(),
        }
    }

    /// Adds a search path for configuration files.
    ///
    /// Once any path is added the default locations are no longer searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load. It must exist.
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

    /// Overrides every other source with `config`.
    pub fn merge(mut self, config: BoticConfig) -> Self {
        self.overrides.push(config);
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<BoticConfig> {
        let figment = self.build_figment()?;
        let config: BoticConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            logging_level = %config.logging.level,
            help_command = %config.router.help_command,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BoticConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        for config in self.overrides {
            figment = figment.merge(Serialized::defaults(config));
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
            _ => Err(ConfigError::ParseError(format!(
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
            paths.push(config_dir.join("botic"));
        }
        paths
    }

    /// Loads the first config file found. Search paths are tried in order
    /// and each path tries every enabled format.
    fn load_config_files(&self, figment: Figment) -> Figment {
        let mut names: Vec<&str> = Vec::new();
        #[cfg(feature = "toml-config")]
        names.push("botic.toml");
        #[cfg(feature = "yaml-config")]
        names.extend(["botic.yaml", "botic.yml"]);

        for search_path in self.resolve_search_paths() {
            for name in &names {
                let path = search_path.join(name);
                if !path.exists() {
                    continue;
                }
                info!(path = %path.display(), "Loading configuration file");
                match Self::merge_config_file(figment.clone(), &path) {
                    Ok(merged) => return merged,
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping configuration file"),
                }
            }
        }

        debug!("No configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from the default locations and environment.
pub fn load_config() -> ConfigResult<BoticConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BoticConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, LogOutput};
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.router.help_command, "help");
            assert!(config.router.help_fallback);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/botic.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_then_env_then_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "botic.toml",
                r#"
                [logging]
                level = "debug"
                output = "stderr"

                [router]
                help_command = "usage"
                help_fallback = false
                "#,
            )?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.output, LogOutput::Stderr);
            assert_eq!(config.router.help_command, "usage");
            assert!(!config.router.help_fallback);

            jail.set_env("BOTIC_ROUTER__HELP_COMMAND", "commands");
            jail.set_env("BOTIC_LOGGING__LEVEL", "warn");
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.router.help_command, "commands");
            assert_eq!(config.logging.level, LogLevel::Warn);

            let mut forced = config.clone();
            forced.logging.level = LogLevel::Trace;
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(forced)
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Trace);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_file_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("botic.toml", "[router]\nhelp_command = \"two words\"\n")?;
            let err = ConfigLoader::new()
                .file(jail.directory().join("botic.toml"))
                .without_env()
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }
}

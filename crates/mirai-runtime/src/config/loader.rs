//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `mirai.toml`
//! - `yaml-config`: enables `mirai.yaml` / `mirai.yml`
//!
//! Both features can be enabled simultaneously; if so, both file formats are
//! searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic base configuration ([`ConfigLoader::merge`])
//! 3. Config file (`mirai.toml` / `mirai.yaml`)
//! 4. Environment variables (`MIRAI_*`)
//! 5. Keyed overrides ([`ConfigLoader::set`])
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `MIRAI_` prefix with `__` as separator:
//!
//! - `MIRAI_CONNECTION__VERIFY_KEY=xxx` → `connection.verify_key = "xxx"`
//! - `MIRAI_SESSION__MODE=concurrent` → `session.mode = "concurrent"`
//! - `MIRAI_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use mirai_runtime::config::ConfigLoader;
//!
//! // Default locations plus environment
//! let config = ConfigLoader::new().load()?;
//!
//! // A specific file, no environment, one forced value
//! let config = ConfigLoader::new()
//!     .file("./deploy/mirai.toml")
//!     .without_env()
//!     .set("session.mode", "concurrent")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

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
use super::schema::MiraiConfig;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "MIRAI_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic base configuration, merged under files and environment.
    figment: Figment,
    /// Keyed overrides, merged over every other source.
    overrides: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
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
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user config directory (`~/.config/mirai` on Linux) to search
    /// paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("mirai"))
        } else {
            self
        }
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

    /// Merges a whole configuration as the base for files and environment.
    ///
    /// Every field of `config` is set, so a later `merge` replaces an earlier
    /// one completely, and files and environment still override it.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(MiraiConfig {
    ///         session: SessionConfig { request_timeout_ms: 9000, ..Default::default() },
    ///         ..Default::default()
    ///     })
    ///     .load()?;
    /// ```
    pub fn merge(mut self, config: MiraiConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Forces one value by its dotted path, over every other source.
    ///
    /// Later calls win over earlier ones for the same key.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .set("connection.qq", 10001)
    ///     .set("logging.level", "debug")
    ///     .load()?;
    /// ```
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<MiraiConfig> {
        let figment = self.build_figment()?;
        let config: MiraiConfig = figment.extract()?;

        debug!(
            host = %config.connection.host,
            port = config.connection.port,
            qq = config.connection.qq,
            mode = %config.session.mode,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(MiraiConfig::default()));

        let base = std::mem::take(&mut self.figment);
        figment = figment.merge(base);

        if let Some(path) = &self.config_file {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, path)?;
            } else {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        figment = figment.merge(self.overrides);

        Ok(figment)
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("mirai"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Merges the first file found among `search_paths × base_names`.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
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
                let path = search_path.join(base_name);
                if path.exists() {
                    info!(path = %path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    /// Searches for and loads configuration files from search paths.
    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = Self::load_format_files(
                figment,
                &search_paths,
                &["mirai.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = Self::load_format_files(
                figment,
                &search_paths,
                &["mirai.yaml", "mirai.yml"],
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

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<MiraiConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` and the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<MiraiConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, LogOutput};
    use mirai_core::{ExecutionMode, LimitPolicy, WsChannel};

    fn empty_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_default_config() {
        let dir = empty_dir();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 8080);
        assert_eq!(config.connection.channel, WsChannel::All);
        assert_eq!(config.session.mode, ExecutionMode::Ordered);
        assert_eq!(config.session.request_timeout_ms, 5000);
        assert!(config.session.rate_limit.is_none());
        assert_eq!(config.logging.level.as_str(), "info");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file() {
        let dir = empty_dir();
        std::fs::write(
            dir.path().join("mirai.toml"),
            r#"
                [connection]
                host = "10.0.0.2"
                port = 8888
                channel = "message"
                verify_key = "INITKEY"
                qq = 10001

                [session]
                mode = "concurrent"
                rate_limit = { per_second = 2, burst = 4, policy = "drop" }

                [logging]
                level = "debug"
                output = "file"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.connection.host, "10.0.0.2");
        assert_eq!(config.connection.channel, WsChannel::Message);
        assert_eq!(config.connection.qq, 10001);
        assert_eq!(config.session.mode, ExecutionMode::Concurrent);
        assert_eq!(config.session.request_timeout_ms, 5000);
        let rate_limit = config.session.rate_limit.unwrap();
        assert_eq!((rate_limit.per_second, rate_limit.burst), (2, Some(4)));
        assert_eq!(rate_limit.policy, LimitPolicy::Drop);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.output, LogOutput::File);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/mirai.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = empty_dir();
        let path = dir.path().join("mirai.ini");
        std::fs::write(&path, "").unwrap();

        let result = ConfigLoader::new().file(&path).without_env().load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_merged_base_under_file() {
        let dir = empty_dir();
        std::fs::write(
            dir.path().join("mirai.toml"),
            "[connection]\nhost = \"10.0.0.2\"\nqq = 10001\n",
        )
        .unwrap();

        let mut base = MiraiConfig::default();
        base.connection.verify_key = "from-code".into();
        base.session.request_timeout_ms = 9000;

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(base)
            .load()
            .unwrap();

        assert_eq!(config.connection.host, "10.0.0.2");
        assert_eq!(config.connection.qq, 10001);
        assert_eq!(config.connection.verify_key, "from-code");
        assert_eq!(config.session.request_timeout_ms, 9000);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_keyed_overrides_win() {
        let dir = empty_dir();
        std::fs::write(
            dir.path().join("mirai.toml"),
            "[connection]\nhost = \"10.0.0.2\"\nqq = 10001\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .set("connection.qq", 42)
            .set("session.mode", "concurrent")
            .set("session.request_timeout_ms", 1000)
            .set("session.request_timeout_ms", 2000)
            .load()
            .unwrap();

        assert_eq!(config.connection.host, "10.0.0.2");
        assert_eq!(config.connection.qq, 42);
        assert_eq!(config.session.mode, ExecutionMode::Concurrent);
        assert_eq!(config.session.request_timeout_ms, 2000);
    }

    #[test]
    fn test_env_overrides() {
        let dir = empty_dir();
        // SAFETY: no other test in this crate reads this variable.
        unsafe {
            std::env::set_var("MIRAI_CONNECTION__VERIFY_KEY", "from-env");
        }
        let config = ConfigLoader::new().search_path(dir.path()).load();
        unsafe {
            std::env::remove_var("MIRAI_CONNECTION__VERIFY_KEY");
        }

        assert_eq!(config.unwrap().connection.verify_key, "from-env");
    }
}

//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use mirai_runtime::{config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use mirai_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .with_level(tracing::Level::DEBUG)
//!     .directive("mirai_core=trace")
//!     .init();
//! ```
//!
//! File output rolls over by date into `<directory>/<prefix>.YYYY-MM-DD.log`
//! (or `YYYY-MM-DD.log` without a prefix), keeping the newest `max_files`.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig};
use crate::error::{RuntimeError, RuntimeResult};

// =============================================================================
// Configuration-Based Initialization
// =============================================================================

/// Initializes logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let builder = LoggingBuilder::from_config(config);

    // Use try_init to avoid panicking if already initialized
    if let Err(e) = builder.try_init() {
        eprintln!("Logging not initialized: {e}");
    }
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for configuring logging.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
    directory: Option<PathBuf>,
    file_prefix: String,
    rotation: LogRotation,
    max_files: usize,
}

impl LoggingBuilder {
    /// Create a new logging builder.
    pub fn new() -> Self {
        Self {
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            with_target: true,
            rotation: LogRotation::Daily,
            max_files: 7,
            ..Default::default()
        }
    }

    /// Create a LoggingBuilder from a LoggingConfig.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();

        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;

        builder.with_thread_ids = config.thread_ids;
        builder.with_file = config.file_location;
        builder.with_line_number = config.file_location;

        builder.directory = Some(config.directory.clone());
        builder.file_prefix.clone_from(&config.file_prefix);
        builder.rotation = config.rotation;
        builder.max_files = config.max_files;

        for (module, level) in &config.filters {
            builder
                .directives
                .push(format!("{}={}", module, level.as_str()));
        }

        builder
    }

    /// Set the global log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a filter directive.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// builder.directive("mirai_core=debug")
    ///        .directive("mirai_transport=trace")
    /// ```
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Set the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include thread IDs in log output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Include file names in log output.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// Include line numbers in log output.
    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Write rolling files into `directory`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self.output = LogOutput::File;
        self
    }

    /// Set the rotation period for file output.
    pub fn rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set maximum number of rotated files to keep.
    pub fn max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    /// Build the filter from directives.
    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        // RUST_LOG takes precedence over the configured base level
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("Ignoring invalid log directive {directive:?}: {e}"),
            }
        }

        filter
    }

    /// Build the rolling file appender for file output.
    fn build_appender(&self) -> RuntimeResult<RollingFileAppender> {
        let directory = self
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("logs"));
        let rotation = match self.rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        };

        let mut builder = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_suffix("log");
        if !self.file_prefix.is_empty() {
            builder = builder.filename_prefix(&self.file_prefix);
        }
        if self.max_files > 0 {
            builder = builder.max_log_files(self.max_files);
        }

        builder
            .build(directory)
            .map_err(|e| RuntimeError::Logging(e.to_string()))
    }

    /// Initialize the logging system.
    pub fn init(self) {
        if let Err(e) = self.try_init() {
            eprintln!("Logging not initialized: {e}");
        }
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> RuntimeResult<()> {
        let filter = self.build_filter();

        // Macro to reduce repetition when configuring layers (non-JSON formats)
        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        // Helper macro to reduce repetition in format matching
        macro_rules! init_with_writer {
            ($writer:expr) => {
                match self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => {
                        let layer = fmt::layer().json().with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Compact => {
                        let layer = configure_layer!(fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer = configure_layer!(fmt::layer().pretty().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    // Without `json-log`, json falls back to the full format
                    _ => {
                        let layer = configure_layer!(fmt::layer().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            };
        }

        let result = match self.output {
            LogOutput::Stdout => init_with_writer!(std::io::stdout),
            LogOutput::Stderr => init_with_writer!(std::io::stderr),
            LogOutput::File => {
                let appender = self.build_appender()?;
                init_with_writer!(appender)
            }
        };

        result.map_err(|e| RuntimeError::Logging(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_from_config() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            file_prefix: "bot".into(),
            rotation: LogRotation::Hourly,
            max_files: 3,
            ..Default::default()
        };
        config.filters.insert("mirai_core".into(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert_eq!(builder.directives, vec!["mirai_core=trace".to_string()]);
        assert_eq!(builder.rotation, LogRotation::Hourly);
        assert_eq!(builder.max_files, 3);
        assert_eq!(builder.file_prefix, "bot");
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        let builder = LoggingBuilder::new().directory(&target);
        assert_eq!(builder.output, LogOutput::File);
        builder.build_appender().unwrap();
        assert!(target.is_dir());
    }
}

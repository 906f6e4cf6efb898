//! Configuration module for mirai bots.
//!
//! This module provides layered configuration loading (defaults, files,
//! environment, programmatic overrides) and validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    ConnectionConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MiraiConfig,
    RateLimitConfig, SessionConfig,
};
pub use validation::validate_config;

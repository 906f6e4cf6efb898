//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use mirai_core::{
    DEFAULT_OUTBOUND_CAPACITY, ExecutionMode, HandshakeParams, LimitPolicy, RateLimiter,
    SessionOptions, WsChannel,
};
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiraiConfig {
    /// Where and as whom to connect.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Request and dispatch behavior.
    #[serde(default)]
    pub session: SessionConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Connection
// =============================================================================

/// Server address and bot identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Push channel to subscribe to.
    #[serde(default)]
    pub channel: WsChannel,

    /// Verify key configured on the server.
    #[serde(default)]
    pub verify_key: String,

    /// Bot account id.
    #[serde(default)]
    pub qq: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            channel: WsChannel::default(),
            verify_key: String::new(),
            qq: 0,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("channel", &self.channel)
            .field("verify_key", &"***")
            .field("qq", &self.qq)
            .finish()
    }
}

impl ConnectionConfig {
    /// Converts to handshake parameters.
    pub fn handshake(&self) -> HandshakeParams {
        HandshakeParams::new(
            self.host.clone(),
            self.port,
            self.channel,
            self.verify_key.clone(),
            self.qq,
        )
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

// =============================================================================
// Session
// =============================================================================

/// Session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Listener execution mode.
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Depth of the outbound frame queue.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Outbound rate limit. Unlimited when absent.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            request_timeout_ms: default_request_timeout_ms(),
            outbound_capacity: default_outbound_capacity(),
            rate_limit: None,
        }
    }
}

impl SessionConfig {
    /// Converts to core session options.
    pub fn to_options(&self) -> ConfigResult<SessionOptions> {
        let mut options = SessionOptions::default()
            .mode(self.mode)
            .request_timeout(Duration::from_millis(self.request_timeout_ms));
        options.outbound_capacity = self.outbound_capacity;
        if let Some(rate_limit) = &self.rate_limit {
            options = options.limiter(rate_limit.to_limiter()?);
        }
        Ok(options)
    }
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_outbound_capacity() -> usize {
    DEFAULT_OUTBOUND_CAPACITY
}

/// Token-bucket rate limit for outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second.
    pub per_second: u32,

    /// Bucket size. Defaults to `per_second`.
    #[serde(default)]
    pub burst: Option<u32>,

    /// What to do when the bucket is empty.
    #[serde(default)]
    pub policy: LimitPolicy,
}

impl RateLimitConfig {
    /// Builds the limiter.
    pub fn to_limiter(&self) -> ConfigResult<RateLimiter> {
        let per_second = NonZeroU32::new(self.per_second)
            .ok_or_else(|| ConfigError::validation("Rate limit per_second must be greater than 0"))?;
        let burst = match self.burst {
            Some(burst) => NonZeroU32::new(burst)
                .ok_or_else(|| ConfigError::validation("Rate limit burst must be greater than 0"))?,
            None => per_second,
        };
        Ok(RateLimiter::per_second(per_second, burst, self.policy))
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
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
    /// Returns the level name as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Rolling files under [`LoggingConfig::directory`].
    File,
}

/// How often log files roll over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Directory for file output.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// File name prefix for file output. Files are named by date when empty.
    #[serde(default)]
    pub file_prefix: String,

    /// Rotation period for file output.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Number of rotated files to keep.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Per-module level overrides, e.g. `mirai_core = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            directory: default_log_directory(),
            file_prefix: String::new(),
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
        }
    }
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_files() -> usize {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_options_from_config() {
        let config = SessionConfig {
            mode: ExecutionMode::Concurrent,
            request_timeout_ms: 1500,
            outbound_capacity: 8,
            rate_limit: Some(RateLimitConfig {
                per_second: 5,
                burst: None,
                policy: LimitPolicy::Drop,
            }),
        };

        let options = config.to_options().unwrap();
        assert_eq!(options.mode, ExecutionMode::Concurrent);
        assert_eq!(options.request_timeout, Duration::from_millis(1500));
        assert_eq!(options.outbound_capacity, 8);
        assert_eq!(
            options.limiter.as_ref().map(RateLimiter::policy),
            Some(LimitPolicy::Drop)
        );
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let rate_limit = RateLimitConfig {
            per_second: 0,
            burst: None,
            policy: LimitPolicy::Wait,
        };
        assert!(rate_limit.to_limiter().is_err());
    }

    #[test]
    fn test_connection_debug_hides_key() {
        let config = ConnectionConfig {
            verify_key: "secret".into(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
        assert_eq!(
            config.handshake().redacted_url(),
            "ws://localhost:8080/all?verifyKey=***&qq=0"
        );
    }
}

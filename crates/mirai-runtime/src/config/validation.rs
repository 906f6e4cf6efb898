//! Configuration validation utilities.

use tracing::warn;

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    ConnectionConfig, LogOutput, LoggingConfig, MiraiConfig, RateLimitConfig, SessionConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &MiraiConfig) -> ConfigResult<()> {
    validate_connection_config(&config.connection)?;
    validate_session_config(&config.session)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the connection target and identity.
fn validate_connection_config(connection: &ConnectionConfig) -> ConfigResult<()> {
    if connection.host.is_empty() {
        return Err(ConfigError::missing_field("connection.host"));
    }

    if connection.host.contains(['/', ' ', '?', '#']) {
        return Err(ConfigError::validation(format!(
            "Host must be a bare host name or address: {}",
            connection.host
        )));
    }

    if connection.port == 0 {
        return Err(ConfigError::InvalidPort(connection.port));
    }

    if connection.qq <= 0 {
        return Err(ConfigError::missing_field("connection.qq"));
    }

    if connection.verify_key.is_empty() {
        warn!("No verify key configured; the server must have verification disabled");
    }

    Ok(())
}

/// Validates request settings.
fn validate_session_config(session: &SessionConfig) -> ConfigResult<()> {
    if session.request_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Request timeout must be greater than 0",
        ));
    }

    if session.outbound_capacity == 0 {
        return Err(ConfigError::validation(
            "Outbound capacity must be greater than 0",
        ));
    }

    if let Some(ref rate_limit) = session.rate_limit {
        validate_rate_limit(rate_limit)?;
    }

    Ok(())
}

/// Validates the rate limit.
fn validate_rate_limit(rate_limit: &RateLimitConfig) -> ConfigResult<()> {
    if rate_limit.per_second == 0 {
        return Err(ConfigError::validation(
            "Rate limit per_second must be greater than 0",
        ));
    }

    if rate_limit.burst == Some(0) {
        return Err(ConfigError::validation(
            "Rate limit burst must be greater than 0",
        ));
    }

    Ok(())
}

/// Validates file output settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        if logging.directory.as_os_str().is_empty() {
            return Err(ConfigError::missing_field("logging.directory"));
        }
        if logging.max_files == 0 {
            return Err(ConfigError::validation(
                "Number of kept log files must be greater than 0",
            ));
        }
    }
    Ok(())
}

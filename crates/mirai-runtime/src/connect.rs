//! Startup helpers: configuration to connected bot, and shutdown.

use mirai_protocol::MiraiBot;
use mirai_transport::TungsteniteConnector;
use tracing::info;

use crate::config::{MiraiConfig, load_config, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Validates `config` and connects a bot with it.
pub async fn connect_from_config(config: &MiraiConfig) -> RuntimeResult<MiraiBot> {
    validate_config(config)?;

    let params = config.connection.handshake();
    let options = config.session.to_options()?;
    let bot = MiraiBot::connect(&TungsteniteConnector, &params, options).await?;

    Ok(bot)
}

/// Loads configuration from the default sources, initializes logging from it
/// and connects.
pub async fn start() -> RuntimeResult<MiraiBot> {
    let config = load_config()?;
    logging::init_from_config(&config.logging);
    connect_from_config(&config).await
}

/// Waits for Ctrl+C, then closes the bot.
pub async fn run_until_shutdown(bot: &MiraiBot) -> RuntimeResult<()> {
    tokio::signal::ctrl_c().await?;
    info!(qq = bot.qq(), "Shutdown signal received");
    bot.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_dialing() {
        let result = connect_from_config(&MiraiConfig::default()).await;
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let mut config = MiraiConfig::default();
        config.connection.host = "127.0.0.1".into();
        config.connection.port = 1;
        config.connection.qq = 10001;
        config.connection.verify_key = "secret".into();

        match connect_from_config(&config).await {
            Err(RuntimeError::Api(e)) => assert!(!e.to_string().contains("secret")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

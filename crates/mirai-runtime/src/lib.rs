//! mirai runtime: configuration, logging and startup.
//!
//! This crate provides:
//! - Layered configuration (`MiraiConfig`, `ConfigLoader`)
//! - Logging configuration (`LoggingBuilder`, `logging::init_from_config`)
//! - Startup from configuration (`connect_from_config`, `start`)
//!
//! ```ignore
//! use mirai_runtime::{run_until_shutdown, start};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // mirai.toml + MIRAI_* environment, logging, connect
//!     let bot = start().await?;
//!
//!     bot.listen_sync(|message: &mirai_protocol::FriendMessage| {
//!         println!("{}", message.message_chain);
//!         true
//!     });
//!
//!     run_until_shutdown(&bot).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connect;
pub mod error;
pub mod logging;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ConnectionConfig, LoggingConfig, MiraiConfig,
    SessionConfig, validate_config,
};
pub use connect::{connect_from_config, run_until_shutdown, start};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

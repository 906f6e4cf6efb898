//! # mirai
//!
//! An async client for the mirai-api-http WebSocket protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  frames  ┌────────────┐  responses  ┌──────────────────┐
//! │ transport │─────────▶│ Dispatcher │────────────▶│ CorrelationTable │──▶ callers
//! │ (socket)  │          │            │  pushes     ┌──────────────────┐
//! └───────────┘          └────────────┘────────────▶│ DecoderRegistry  │──▶ executor ──▶ listeners
//!       ▲                                           └──────────────────┘
//!       └──────────── Session::call (syncId, timeout, rate limit) ◀── MiraiBot
//! ```
//!
//! - **mirai-core**: connection handle, correlation, decoding, listener
//!   dispatch and the request façade
//! - **mirai-transport**: the tokio-tungstenite socket loop
//! - **mirai-protocol**: wire schemas and the typed [`MiraiBot`] API
//! - **mirai-runtime**: configuration, logging and startup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mirai::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = mirai::connect("localhost", 8080, WsChannel::All, "INITKEY", 10001, ExecutionMode::Ordered).await?;
//!
//!     let replier = bot.clone();
//!     bot.listen_friend_message(move |message: Arc<FriendMessage>| {
//!         let bot = replier.clone();
//!         async move {
//!             let echo = message.message_chain.without_source();
//!             bot.send_friend_message(message.sender.id, echo, None).await.ok();
//!             true
//!         }
//!     });
//!
//!     mirai::runtime::run_until_shutdown(&bot).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `mirai.toml` configuration files (default)
//! - `yaml-config`: `mirai.yaml` configuration files
//! - `json-log`: JSON log format

pub use mirai_core as core;
pub use mirai_protocol as protocol;
pub use mirai_runtime as runtime;
pub use mirai_transport as transport;

pub use mirai_core::{ApiError, ApiResult, ExecutionMode, WsChannel};
pub use mirai_protocol::MiraiBot;

use mirai_core::{HandshakeParams, SessionOptions};
use mirai_transport::TungsteniteConnector;

/// Connects a bot with default session options.
///
/// `mode` selects whether listeners run one at a time in arrival order
/// ([`ExecutionMode::Ordered`]) or each in its own task
/// ([`ExecutionMode::Concurrent`]).
pub async fn connect(
    host: &str,
    port: u16,
    channel: WsChannel,
    verify_key: &str,
    qq: i64,
    mode: ExecutionMode,
) -> ApiResult<MiraiBot> {
    let params = HandshakeParams::new(host, port, channel, verify_key, qq);
    let options = SessionOptions::default().mode(mode);
    MiraiBot::connect(&TungsteniteConnector, &params, options).await
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mirai::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Connection and options
    pub use mirai_core::{
        ApiError, ApiResult, ExecutionMode, HandshakeParams, LimitPolicy, RateLimiter,
        SessionOptions, WsChannel,
    };

    // Bot API, messages and events
    pub use mirai_protocol::model::*;
    pub use mirai_protocol::MiraiBot;

    // Configuration and logging
    pub use mirai_runtime::{ConfigLoader, LoggingBuilder, MiraiConfig, connect_from_config};
}

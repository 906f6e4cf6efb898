//! # Mirai Transport
//!
//! Socket implementations of [`mirai_core::WsConnector`].
//!
//! ## Features
//!
//! - `ws-client` (default): WebSocket client over `tokio-tungstenite`
//!
//! ```rust,ignore
//! use mirai_transport::TungsteniteConnector;
//!
//! let session = Session::connect(&TungsteniteConnector, &params, decoders, options).await?;
//! ```

#[cfg(feature = "ws-client")]
pub mod websocket;

#[cfg(feature = "ws-client")]
pub use websocket::TungsteniteConnector;

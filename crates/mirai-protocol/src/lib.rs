//! # mirai-api-http protocol
//!
//! Wire schemas and the typed bot API on top of [`mirai_core`].
//!
//! ## Overview
//!
//! - [`model`]: contacts, message segments, message chains, every pushed
//!   message container and event, and request payloads
//! - [`decoders`]: the shared [`DecoderRegistry`](mirai_core::DecoderRegistry)
//!   binding every push tag to its schema
//! - [`MiraiBot`]: one method per command, plus typed listener registration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mirai_core::{HandshakeParams, SessionOptions, WsChannel};
//! use mirai_protocol::{GroupMessage, MiraiBot};
//! use mirai_transport::TungsteniteConnector;
//!
//! let params = HandshakeParams::new("localhost", 8080, WsChannel::All, "key", 10001);
//! let bot = MiraiBot::connect(&TungsteniteConnector, &params, SessionOptions::default()).await?;
//!
//! bot.listen_sync(|message: &GroupMessage| {
//!     println!("{}: {}", message.sender, message.message_chain);
//!     true
//! });
//! ```
//!
//! ## Event Hierarchy
//!
//! ```text
//! push (tag = data.type)
//! ├── message  FriendMessage, GroupMessage, TempMessage, StrangerMessage,
//! │            OtherClientMessage, FriendSyncMessage, GroupSyncMessage,
//! │            TempSyncMessage, StrangerSyncMessage
//! ├── notice   Bot*Event, Group*Event, Member*Event, FriendRecallEvent,
//! │            NudgeEvent
//! └── request  NewFriendRequestEvent, MemberJoinRequestEvent,
//!              BotInvitedJoinGroupRequestEvent
//! ```

pub mod bot;
pub mod decoders;
pub mod model;

pub use bot::MiraiBot;
pub use model::*;

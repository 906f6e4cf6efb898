//! Push payloads: message containers and events.
//!
//! Every push carries a `type` tag. Each struct here is the schema for
//! exactly one tag, and its Rust name is the tag:
//!
//! ```text
//! message   FriendMessage, GroupMessage, TempMessage, StrangerMessage,
//!           OtherClientMessage, *SyncMessage
//! notice    Bot*Event, Group*Event, Member*Event, FriendRecallEvent, NudgeEvent
//! request   NewFriendRequestEvent, MemberJoinRequestEvent,
//!           BotInvitedJoinGroupRequestEvent
//! ```
//!
//! # Parsing
//!
//! Each submodule binds its schemas to their tags and exposes the matching
//! decoder entries (`message_decoders()`, `notice_decoders()`,
//! `request_decoders()`); [`crate::decoders`] assembles them into one
//! registry.

/// Implements [`mirai_core::TypedEvent`] for each listed type, using the type
/// name as the wire tag, and generates a function listing their decoders.
macro_rules! typed_events {
    (fn $decoders:ident; $($ty:ident),* $(,)?) => {
        $(
            impl ::mirai_core::TypedEvent for $ty {
                const TYPE_TAG: &'static str = stringify!($ty);
            }
        )*

        /// Decoder entries for every schema in this module.
        pub fn $decoders() -> Vec<::mirai_core::DecoderEntry> {
            vec![$(::mirai_core::DecoderEntry::of::<$ty>()),*]
        }
    };
}

pub mod message;
pub mod notice;
pub mod request;

pub use message::*;
pub use notice::*;
pub use request::*;

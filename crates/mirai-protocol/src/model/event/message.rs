//! Message containers.
//!
//! Received messages come in two shapes: messages *to* the bot carry a
//! `sender`, messages the bot's other clients sent (`*SyncMessage`) carry a
//! `subject`. A container whose sender or subject is missing or malformed
//! fails to decode as a whole; bad segments inside the chain are only
//! skipped.

use serde::{Deserialize, Serialize};

use crate::model::message::MessageChain;
use crate::model::types::{Friend, Group, Member, OtherClient};

// ============================================================================
// Sender Containers
// ============================================================================

/// A private message from a friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendMessage {
    /// The friend who sent it.
    pub sender: Friend,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A message in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    /// The member who sent it; `sender.group` is the group.
    pub sender: Member,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A temporary private message from a group member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempMessage {
    /// The member who sent it.
    pub sender: Member,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A message from a stranger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrangerMessage {
    /// The stranger who sent it.
    pub sender: Friend,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A message from another client of the bot's own account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherClientMessage {
    /// The client that sent it.
    pub sender: OtherClient,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

// ============================================================================
// Sync Containers
// ============================================================================

/// A private message the bot's account sent to a friend from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSyncMessage {
    /// The friend it was sent to.
    pub subject: Friend,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A group message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSyncMessage {
    /// The group it was sent to.
    pub subject: Group,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A temporary message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempSyncMessage {
    /// The member it was sent to.
    pub subject: Member,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

/// A stranger message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrangerSyncMessage {
    /// The stranger it was sent to.
    pub subject: Friend,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
}

typed_events!(
    fn message_decoders;
    FriendMessage,
    GroupMessage,
    TempMessage,
    StrangerMessage,
    OtherClientMessage,
    FriendSyncMessage,
    GroupSyncMessage,
    TempSyncMessage,
    StrangerSyncMessage,
);

// ============================================================================
// AnyMessage
// ============================================================================

/// A stored message of any primary kind, as returned by `messageFromId` and
/// `roamingMessages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnyMessage {
    /// Friend message.
    FriendMessage(FriendMessage),
    /// Group message.
    GroupMessage(GroupMessage),
    /// Temporary message.
    TempMessage(TempMessage),
    /// Stranger message.
    StrangerMessage(StrangerMessage),
}

impl AnyMessage {
    /// The message content.
    pub fn message_chain(&self) -> &MessageChain {
        match self {
            AnyMessage::FriendMessage(m) => &m.message_chain,
            AnyMessage::GroupMessage(m) => &m.message_chain,
            AnyMessage::TempMessage(m) => &m.message_chain,
            AnyMessage::StrangerMessage(m) => &m.message_chain,
        }
    }

    /// Account id of the sender.
    pub fn sender_id(&self) -> i64 {
        match self {
            AnyMessage::FriendMessage(m) => m.sender.id,
            AnyMessage::GroupMessage(m) => m.sender.id,
            AnyMessage::TempMessage(m) => m.sender.id,
            AnyMessage::StrangerMessage(m) => m.sender.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::segment::SingleMessage;
    use mirai_core::TypedEvent;
    use serde_json::json;

    #[test]
    fn test_group_message_decode() {
        let message = GroupMessage::decode(&json!({
            "type": "GroupMessage",
            "sender": {
                "id": 123,
                "memberName": "alice",
                "permission": "MEMBER",
                "group": {"id": 456, "name": "g", "permission": "ADMINISTRATOR"}
            },
            "messageChain": [
                {"type": "Source", "id": 9, "time": 1},
                {"type": "Plain", "text": "hello"}
            ]
        }))
        .unwrap();

        assert_eq!(message.sender.group.id, 456);
        assert_eq!(message.message_chain.message_id(), Some(9));
        assert_eq!(
            message.message_chain.as_slice()[1],
            SingleMessage::plain("hello")
        );
    }

    #[test]
    fn test_missing_or_malformed_sender_fails() {
        assert!(FriendMessage::decode(&json!({"type": "FriendMessage", "messageChain": []})).is_err());
        assert!(
            FriendMessage::decode(&json!({"sender": "bob", "messageChain": []})).is_err()
        );
        assert!(GroupSyncMessage::decode(&json!({"sender": {"id": 1}})).is_err());
    }

    #[test]
    fn test_any_message() {
        let message: AnyMessage = serde_json::from_value(json!({
            "type": "FriendMessage",
            "sender": {"id": 7, "nickname": "bob", "remark": ""},
            "messageChain": [{"type": "Plain", "text": "yo"}]
        }))
        .unwrap();

        assert_eq!(message.sender_id(), 7);
        assert_eq!(message.message_chain().plain_text(), "yo");
    }

    #[test]
    fn test_decoder_tags() {
        let tags: Vec<_> = message_decoders().iter().map(|e| e.tag()).collect();
        assert_eq!(tags.len(), 9);
        assert!(tags.contains(&"OtherClientMessage"));
        assert!(tags.contains(&"StrangerSyncMessage"));
    }
}

//! Request events that the bot answers through the `resp_*` commands.
//!
//! Each carries an `event_id` that must be echoed back together with the
//! requester and group ids; see [`crate::MiraiBot::respond_new_friend_request`]
//! and friends.

use serde::{Deserialize, Serialize};

/// Someone asked to become the bot's friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFriendRequestEvent {
    /// Id to echo in the response.
    pub event_id: i64,
    /// Requester account id.
    pub from_id: i64,
    /// Group the request came through, `0` if none.
    #[serde(default)]
    pub group_id: i64,
    /// Requester nickname or group card.
    #[serde(default)]
    pub nick: String,
    /// Request message.
    #[serde(default)]
    pub message: String,
}

/// Someone asked to join a group the bot administers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinRequestEvent {
    /// Id to echo in the response.
    pub event_id: i64,
    /// Requester account id.
    pub from_id: i64,
    /// Group id.
    pub group_id: i64,
    /// Group name.
    #[serde(default)]
    pub group_name: String,
    /// Requester nickname.
    #[serde(default)]
    pub nick: String,
    /// Request message.
    #[serde(default)]
    pub message: String,
    /// Who invited the requester, if anyone.
    #[serde(default)]
    pub invitor_id: Option<i64>,
}

/// A friend invited the bot into a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInvitedJoinGroupRequestEvent {
    /// Id to echo in the response.
    pub event_id: i64,
    /// Inviter account id.
    pub from_id: i64,
    /// Group id.
    pub group_id: i64,
    /// Group name.
    #[serde(default)]
    pub group_name: String,
    /// Inviter nickname.
    #[serde(default)]
    pub nick: String,
    /// Invitation message.
    #[serde(default)]
    pub message: String,
}

typed_events!(
    fn request_decoders;
    NewFriendRequestEvent,
    MemberJoinRequestEvent,
    BotInvitedJoinGroupRequestEvent,
);

#[cfg(test)]
mod tests {
    use super::*;
    use mirai_core::TypedEvent;
    use serde_json::json;

    #[test]
    fn test_member_join_request() {
        let event = MemberJoinRequestEvent::decode(&json!({
            "type": "MemberJoinRequestEvent",
            "eventId": 12345678,
            "fromId": 123,
            "groupId": 456,
            "groupName": "Group",
            "nick": "Nick",
            "message": "let me in",
            "invitorId": null
        }))
        .unwrap();

        assert_eq!(event.event_id, 12345678);
        assert_eq!(event.invitor_id, None);
        assert_eq!(MemberJoinRequestEvent::TYPE_TAG, "MemberJoinRequestEvent");
    }
}

//! The typed bot API.
//!
//! [`MiraiBot`] wraps a [`Session`] and gives every mirai-api-http command a
//! strongly-typed method, plus one `listen_*` helper per message container.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mirai_protocol::{GroupMessage, MessageChain, MiraiBot};
//!
//! bot.listen_group_message({
//!     let bot = bot.clone();
//!     move |message: Arc<GroupMessage>| {
//!         let bot = bot.clone();
//!         async move {
//!             let reply = MessageChain::new().at(message.sender.id).plain(" pong");
//!             bot.send_group_message(message.sender.group.id, reply, None).await.ok();
//!             true
//!         }
//!     }
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::decoders;
use crate::model::api::{
    About, BotInvitedOperate, FileInfo, FileParam, GroupConfig, MemberInfoUpdate,
    MemberJoinOperate, NewFriendOperate, RequestResponse,
};
use crate::model::event::{
    AnyMessage, BotInvitedJoinGroupRequestEvent, FriendMessage, FriendSyncMessage, GroupMessage,
    GroupSyncMessage, MemberJoinRequestEvent, NewFriendRequestEvent, OtherClientMessage,
    StrangerMessage, StrangerSyncMessage, TempMessage, TempSyncMessage,
};
use crate::model::message::MessageChain;
use crate::model::types::{Friend, Group, Kind, Member, Profile};
use mirai_core::{
    ApiResult, ExecutionMode, HandshakeParams, RateLimiter, Session, SessionOptions, TypedEvent,
    WsConnector,
};

// =============================================================================
// MiraiBot
// =============================================================================

/// A connected mirai bot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MiraiBot {
    session: Session,
}

impl MiraiBot {
    /// Dials the server and returns a bot using the shared decoder registry.
    pub async fn connect(
        connector: &dyn WsConnector,
        params: &HandshakeParams,
        options: SessionOptions,
    ) -> ApiResult<Self> {
        let session = Session::connect(connector, params, decoders::registry(), options).await?;
        Ok(Self { session })
    }

    /// Wraps an existing session.
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for raw commands.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The bot account id.
    pub fn qq(&self) -> i64 {
        self.session.qq()
    }

    /// The listener execution mode.
    pub fn mode(&self) -> ExecutionMode {
        self.session.mode()
    }

    /// Returns `true` while the connection is up.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Closes the connection.
    pub fn close(&self) {
        self.session.close();
    }

    /// Installs, replaces or removes the request rate limiter.
    pub fn set_limiter(&self, limiter: Option<RateLimiter>) {
        self.session.set_limiter(limiter);
    }

    /// Runs `fut` on the listener executor.
    pub fn run<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.session.run(fut);
    }

    /// Registers an async listener for any event or message container.
    ///
    /// Listeners for one tag run in registration order; returning `false`
    /// stops the rest.
    pub fn listen<E, F, Fut>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.session.listen::<E, F, Fut>(listener);
    }

    /// Registers a synchronous listener for any event or message container.
    pub fn listen_sync<E, F>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.session.listen_sync::<E, F>(listener);
    }
}

macro_rules! listen_helpers {
    ($($(#[$meta:meta])* $name:ident => $ty:ty),* $(,)?) => {
        impl MiraiBot {
            $(
                $(#[$meta])*
                pub fn $name<F, Fut>(&self, listener: F)
                where
                    F: Fn(Arc<$ty>) -> Fut + Send + Sync + 'static,
                    Fut: Future<Output = bool> + Send + 'static,
                {
                    self.listen::<$ty, F, Fut>(listener);
                }
            )*
        }
    };
}

listen_helpers!(
    /// Listens for friend messages.
    listen_friend_message => FriendMessage,
    /// Listens for group messages.
    listen_group_message => GroupMessage,
    /// Listens for temporary messages.
    listen_temp_message => TempMessage,
    /// Listens for stranger messages.
    listen_stranger_message => StrangerMessage,
    /// Listens for messages from the account's other clients.
    listen_other_client_message => OtherClientMessage,
    /// Listens for friend messages sent from other clients.
    listen_friend_sync_message => FriendSyncMessage,
    /// Listens for group messages sent from other clients.
    listen_group_sync_message => GroupSyncMessage,
    /// Listens for temporary messages sent from other clients.
    listen_temp_sync_message => TempSyncMessage,
    /// Listens for stranger messages sent from other clients.
    listen_stranger_sync_message => StrangerSyncMessage,
);

// =========================================================================
// API Macro
// =========================================================================

/// Generates a typed wrapper for one command.
///
/// Arguments are listed as `"wireKey": name: Type`. The return form selects
/// what the reply is decoded from: nothing, the `data` field, the whole
/// response object (`response`), or a named field.
macro_rules! impl_api {
    (@sub) => { None };
    (@sub $sub:literal) => { Some($sub) };
    (@content) => { None };
    (@content $($key:literal: $arg:expr),+) => { Some(json!({ $($key: $arg),+ })) };

    // Whole response object
    ($(#[$meta:meta])* $name:ident => $cmd:literal $(/ $sub:literal)?,
     ($($key:literal: $arg:ident: $typ:ty),*) -> $ret:ty, response $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            let response = self
                .session
                .call($cmd, impl_api!(@sub $($sub)?), impl_api!(@content $($key: $arg),*))
                .await?;
            Ok(serde_json::from_value::<$ret>(response)?)
        }
    };
    // A specific field of the response
    ($(#[$meta:meta])* $name:ident => $cmd:literal $(/ $sub:literal)?,
     ($($key:literal: $arg:ident: $typ:ty),*) -> $ret:ty, $field:literal $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            let value = self
                .session
                .call_field($cmd, impl_api!(@sub $($sub)?), impl_api!(@content $($key: $arg),*), $field)
                .await?;
            Ok(serde_json::from_value::<$ret>(value)?)
        }
    };
    // The response's "data" field
    ($(#[$meta:meta])* $name:ident => $cmd:literal $(/ $sub:literal)?,
     ($($key:literal: $arg:ident: $typ:ty),*) -> $ret:ty $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            let data = self
                .session
                .call_data($cmd, impl_api!(@sub $($sub)?), impl_api!(@content $($key: $arg),*))
                .await?;
            Ok(serde_json::from_value::<$ret>(data)?)
        }
    };
    // No return value
    ($(#[$meta:meta])* $name:ident => $cmd:literal $(/ $sub:literal)?,
     ($($key:literal: $arg:ident: $typ:ty),*) $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<()> {
            self.session
                .call($cmd, impl_api!(@sub $($sub)?), impl_api!(@content $($key: $arg),*))
                .await?;
            Ok(())
        }
    };
}

// =========================================================================
// General APIs
// =========================================================================

impl MiraiBot {
    impl_api!(
        /// Returns the plugin version.
        about => "about",
        () -> About
    );

    impl_api!(
        /// Lists the accounts logged in on the server.
        bot_list => "botList",
        () -> Vec<i64>
    );

    impl_api!(
        /// Fetches a cached message by id. `target` is the friend or group
        /// the message belongs to.
        message_from_id => "messageFromId",
        ("messageId": message_id: i64, "target": target: i64) -> AnyMessage
    );

    impl_api!(
        /// Fetches the stored history with a friend between two unix
        /// timestamps.
        roaming_messages => "roamingMessages",
        ("timeStart": time_start: i64, "timeEnd": time_end: i64, "target": target: i64)
            -> Vec<AnyMessage>
    );
}

// =========================================================================
// Message APIs
// =========================================================================

impl MiraiBot {
    /// Sends a message to a friend, optionally quoting message `quote`.
    /// Returns the id of the sent message.
    pub async fn send_friend_message(
        &self,
        target: i64,
        message: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        let content = json!({ "target": target });
        self.send_message("sendFriendMessage", content, message.into(), quote)
            .await
    }

    /// Sends a message to a group, optionally quoting message `quote`.
    /// Returns the id of the sent message.
    pub async fn send_group_message(
        &self,
        target: i64,
        message: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        let content = json!({ "target": target });
        self.send_message("sendGroupMessage", content, message.into(), quote)
            .await
    }

    /// Sends a temporary message to member `qq` of `group`.
    /// Returns the id of the sent message.
    pub async fn send_temp_message(
        &self,
        qq: i64,
        group: i64,
        message: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        let content = json!({ "qq": qq, "group": group });
        self.send_message("sendTempMessage", content, message.into(), quote)
            .await
    }

    async fn send_message(
        &self,
        command: &str,
        mut content: Value,
        message: MessageChain,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        content["messageChain"] = serde_json::to_value(message)?;
        if let Some(quote) = quote {
            content["quote"] = json!(quote);
        }
        let message_id = self
            .session
            .call_field(command, None, Some(content), "messageId")
            .await?;
        Ok(serde_json::from_value(message_id)?)
    }

    impl_api!(
        /// Nudges `target` in the chat `subject` of the given kind.
        send_nudge => "sendNudge",
        ("target": target: i64, "subject": subject: i64, "kind": kind: Kind)
    );

    impl_api!(
        /// Recalls message `message_id` in the chat `target`.
        recall => "recall",
        ("target": target: i64, "messageId": message_id: i64)
    );
}

// =========================================================================
// Group Administration APIs
// =========================================================================

impl MiraiBot {
    impl_api!(
        /// Mutes a member for `seconds` (at most 30 days).
        mute => "mute",
        ("target": group: i64, "memberId": member_id: i64, "time": seconds: i64)
    );

    impl_api!(
        /// Unmutes a member.
        unmute => "unmute",
        ("target": group: i64, "memberId": member_id: i64)
    );

    impl_api!(
        /// Removes a member, optionally blocking them from rejoining.
        kick => "kick",
        ("target": group: i64, "memberId": member_id: i64, "block": block: bool, "msg": message: &str)
    );

    impl_api!(
        /// Leaves a group.
        quit => "quit",
        ("target": group: i64)
    );

    impl_api!(
        /// Mutes everyone.
        mute_all => "muteAll",
        ("target": group: i64)
    );

    impl_api!(
        /// Lifts mute-all.
        unmute_all => "unmuteAll",
        ("target": group: i64)
    );

    impl_api!(
        /// Marks a message as essence.
        set_essence => "setEssence",
        ("target": group: i64, "messageId": message_id: i64)
    );

    impl_api!(
        /// Reads a group's settings.
        group_config => "groupConfig" / "get",
        ("target": group: i64) -> GroupConfig, response
    );

    impl_api!(
        /// Writes a group's settings.
        update_group_config => "groupConfig" / "update",
        ("target": group: i64, "config": config: &GroupConfig)
    );

    impl_api!(
        /// Reads a member's details.
        member_info => "memberInfo" / "get",
        ("target": group: i64, "memberId": member_id: i64) -> Member, response
    );

    impl_api!(
        /// Changes a member's card or special title.
        update_member_info => "memberInfo" / "update",
        ("target": group: i64, "memberId": member_id: i64, "info": info: &MemberInfoUpdate)
    );

    impl_api!(
        /// Grants or revokes administrator. The bot must be the owner.
        member_admin => "memberAdmin",
        ("target": group: i64, "memberId": member_id: i64, "assign": assign: bool)
    );
}

// =========================================================================
// Contact APIs
// =========================================================================

impl MiraiBot {
    impl_api!(
        /// Lists the bot's friends.
        friend_list => "friendList",
        () -> Vec<Friend>
    );

    impl_api!(
        /// Lists the bot's groups.
        group_list => "groupList",
        () -> Vec<Group>
    );

    impl_api!(
        /// Lists a group's members from the cache.
        member_list => "memberList",
        ("target": group: i64) -> Vec<Member>
    );

    impl_api!(
        /// Lists a group's members fresh from the server. An empty
        /// `member_ids` fetches everyone.
        latest_member_list => "latestMemberList",
        ("target": group: i64, "memberIds": member_ids: &[i64]) -> Vec<Member>
    );

    impl_api!(
        /// Removes a friend.
        delete_friend => "deleteFriend",
        ("target": target: i64)
    );

    impl_api!(
        /// The bot's own profile.
        bot_profile => "botProfile",
        () -> Profile, response
    );

    impl_api!(
        /// A friend's profile.
        friend_profile => "friendProfile",
        ("target": target: i64) -> Profile, response
    );

    impl_api!(
        /// A group member's profile.
        member_profile => "memberProfile",
        ("target": group: i64, "memberId": member_id: i64) -> Profile, response
    );

    impl_api!(
        /// Any user's profile.
        user_profile => "userProfile",
        ("target": target: i64) -> Profile, response
    );
}

// =========================================================================
// File APIs
// =========================================================================

impl MiraiBot {
    async fn file_command(&self, command: &str, param: &FileParam) -> ApiResult<Value> {
        let content = serde_json::to_value(param)?;
        self.session.call_data(command, None, Some(content)).await
    }

    /// Lists a folder.
    pub async fn file_list(&self, param: &FileParam) -> ApiResult<Vec<FileInfo>> {
        let data = self.file_command("file_list", param).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Describes one file or folder.
    pub async fn file_info(&self, param: &FileParam) -> ApiResult<FileInfo> {
        let data = self.file_command("file_info", param).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Creates the folder named by `param.directory_name`.
    pub async fn file_mkdir(&self, param: &FileParam) -> ApiResult<FileInfo> {
        let data = self.file_command("file_mkdir", param).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Deletes a file or folder.
    pub async fn file_delete(&self, param: &FileParam) -> ApiResult<()> {
        let content = serde_json::to_value(param)?;
        self.session.call("file_delete", None, Some(content)).await?;
        Ok(())
    }

    /// Moves a file to `param.move_to` or `param.move_to_path`.
    pub async fn file_move(&self, param: &FileParam) -> ApiResult<()> {
        let content = serde_json::to_value(param)?;
        self.session.call("file_move", None, Some(content)).await?;
        Ok(())
    }

    /// Renames a file to `param.rename_to`.
    pub async fn file_rename(&self, param: &FileParam) -> ApiResult<()> {
        let content = serde_json::to_value(param)?;
        self.session.call("file_rename", None, Some(content)).await?;
        Ok(())
    }
}

// =========================================================================
// Request Responses
// =========================================================================

impl MiraiBot {
    async fn respond<O: serde::Serialize>(
        &self,
        command: &str,
        response: RequestResponse<O>,
    ) -> ApiResult<()> {
        let content = serde_json::to_value(response)?;
        self.session.call(command, None, Some(content)).await?;
        Ok(())
    }

    /// Answers a friend request.
    pub async fn respond_new_friend_request(
        &self,
        request: &NewFriendRequestEvent,
        operate: NewFriendOperate,
        message: impl Into<String>,
    ) -> ApiResult<()> {
        let response = RequestResponse {
            event_id: request.event_id,
            from_id: request.from_id,
            group_id: request.group_id,
            operate,
            message: message.into(),
        };
        self.respond("resp_newFriendRequestEvent", response).await
    }

    /// Answers a join request. The bot must be an administrator.
    pub async fn respond_member_join_request(
        &self,
        request: &MemberJoinRequestEvent,
        operate: MemberJoinOperate,
        message: impl Into<String>,
    ) -> ApiResult<()> {
        let response = RequestResponse {
            event_id: request.event_id,
            from_id: request.from_id,
            group_id: request.group_id,
            operate,
            message: message.into(),
        };
        self.respond("resp_memberJoinRequestEvent", response).await
    }

    /// Answers a group invitation.
    pub async fn respond_bot_invited_join_group_request(
        &self,
        request: &BotInvitedJoinGroupRequestEvent,
        operate: BotInvitedOperate,
        message: impl Into<String>,
    ) -> ApiResult<()> {
        let response = RequestResponse {
            event_id: request.event_id,
            from_id: request.from_id,
            group_id: request.group_id,
            operate,
            message: message.into(),
        };
        self.respond("resp_botInvitedJoinGroupRequestEvent", response)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirai_core::{ApiError, FrameHandler, connection_pair};
    use tokio::sync::mpsc;

    /// Starts a fake server that records each request and answers it with
    /// `reply(request)` as the response object.
    fn start(reply: fn(&Value) -> Value) -> (MiraiBot, mpsc::UnboundedReceiver<Value>) {
        let (handle, driver) = connection_pair(16);
        let session = Session::new(10001, handle, decoders::registry(), SessionOptions::default());
        let handler = session.frame_handler();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut outbound, _shutdown) = driver.into_parts();
            while let Some(frame) = outbound.recv().await {
                let request: Value = serde_json::from_slice(&frame.data).unwrap();
                frame.complete(Ok(()));
                let response = json!({
                    "syncId": request["syncId"].to_string(),
                    "data": reply(&request),
                });
                handler.on_frame(&serde_json::to_vec(&response).unwrap()).await;
                let _ = seen_tx.send(request);
            }
        });

        (MiraiBot::from_session(session), seen_rx)
    }

    #[tokio::test]
    async fn test_send_group_message_with_quote() {
        let (bot, mut seen) = start(|_| json!({"code": 0, "msg": "", "messageId": 77}));

        let id = bot
            .send_group_message(456, MessageChain::new().plain("hi"), Some(5))
            .await
            .unwrap();
        assert_eq!(id, 77);

        let request = seen.recv().await.unwrap();
        assert_eq!(request["command"], "sendGroupMessage");
        assert!(request.get("subCommand").is_none());
        assert_eq!(
            request["content"],
            json!({
                "target": 456,
                "quote": 5,
                "messageChain": [{"type": "Plain", "text": "hi"}]
            })
        );
    }

    #[tokio::test]
    async fn test_sub_command_and_whole_response() {
        let (bot, mut seen) = start(|_| {
            json!({"name": "g", "announcement": "", "confessTalk": true, "allowMemberInvite": false,
                   "autoApprove": false, "anonymousChat": false, "muteAll": true})
        });

        let config = bot.group_config(456).await.unwrap();
        assert!(config.confess_talk);
        assert!(config.mute_all);

        let request = seen.recv().await.unwrap();
        assert_eq!(request["command"], "groupConfig");
        assert_eq!(request["subCommand"], "get");
        assert_eq!(request["content"], json!({"target": 456}));
    }

    #[tokio::test]
    async fn test_data_field() {
        let (bot, mut seen) = start(|_| {
            json!({"code": 0, "msg": "", "data": [{"id": 1, "nickname": "a", "remark": "b"}]})
        });

        let friends = bot.friend_list().await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].nickname, "a");

        let request = seen.recv().await.unwrap();
        assert!(request.get("content").is_none());
    }

    #[tokio::test]
    async fn test_remote_error() {
        let (bot, _seen) = start(|_| json!({"code": 10, "msg": "no permission"}));

        match bot.mute(1, 2, 60).await {
            Err(ApiError::Remote { code, message }) => {
                assert_eq!(code, 10);
                assert_eq!(message, "no permission");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_corrected_command_names() {
        let (bot, mut seen) = start(|_| json!({"code": 0, "msg": ""}));

        tokio_test::assert_ok!(bot.file_delete(&FileParam::group(1, "/x")).await);
        assert_eq!(seen.recv().await.unwrap()["command"], "file_delete");

        let invite = BotInvitedJoinGroupRequestEvent {
            event_id: 9,
            from_id: 2,
            group_id: 3,
            group_name: String::new(),
            nick: String::new(),
            message: String::new(),
        };
        bot.respond_bot_invited_join_group_request(&invite, BotInvitedOperate::Accept, "")
            .await
            .unwrap();
        let request = seen.recv().await.unwrap();
        assert_eq!(request["command"], "resp_botInvitedJoinGroupRequestEvent");
        assert_eq!(
            request["content"],
            json!({"eventId": 9, "fromId": 2, "groupId": 3, "operate": 0, "message": ""})
        );
    }

    #[tokio::test]
    async fn test_argument_keys() {
        let (bot, mut seen) = start(|_| json!({"code": 0, "msg": ""}));

        tokio_test::assert_ok!(bot.kick(1, 2, true, "bye").await);
        assert_eq!(
            seen.recv().await.unwrap()["content"],
            json!({"target": 1, "memberId": 2, "block": true, "msg": "bye"})
        );

        bot.update_member_info(1, 2, &MemberInfoUpdate::default().name("card"))
            .await
            .unwrap();
        assert_eq!(
            seen.recv().await.unwrap()["content"],
            json!({"target": 1, "memberId": 2, "info": {"name": "card"}})
        );
    }
}

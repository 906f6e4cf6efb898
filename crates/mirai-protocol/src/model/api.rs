//! Request and response payloads of the bot API.
//!
//! Most commands take a handful of scalar arguments and are built inline by
//! [`crate::MiraiBot`]; the types here cover the structured ones.

use serde::{Deserialize, Serialize, Serializer};

use super::types::Group;

/// Reply of the `about` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    /// mirai-api-http plugin version.
    #[serde(default)]
    pub version: String,
}

// ============================================================================
// Group Administration
// ============================================================================

/// Group settings, as read by `groupConfig get` and written by
/// `groupConfig update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupConfig {
    /// Group name.
    pub name: String,
    /// Group announcement.
    pub announcement: String,
    /// Whether confess talk is enabled.
    pub confess_talk: bool,
    /// Whether members may invite others.
    pub allow_member_invite: bool,
    /// Whether join requests are approved automatically.
    pub auto_approve: bool,
    /// Whether anonymous chat is enabled.
    pub anonymous_chat: bool,
    /// Whether everyone is muted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub mute_all: bool,
}

/// Fields of a member to change through `memberInfo update`.
///
/// Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfoUpdate {
    /// New group card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New special title. Only the owner can set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_title: Option<String>,
}

impl MemberInfoUpdate {
    /// Changes the group card.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Changes the special title.
    pub fn special_title(mut self, title: impl Into<String>) -> Self {
        self.special_title = Some(title.into());
        self
    }
}

// ============================================================================
// Files
// ============================================================================

/// Arguments of the `file_*` commands.
///
/// `id` is the file or folder id (empty for the root); `path` may be given
/// instead, though paths are ambiguous because folder names may repeat. Set
/// `group` for a group file and `qq` for a friend file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParam {
    /// File or folder id.
    #[serde(default)]
    pub id: String,
    /// File or folder path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Group or friend id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
    /// Group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,
    /// Friend id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qq: Option<i64>,
    /// Whether to include download info, which costs an extra lookup.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub with_download_info: bool,
    /// Page offset for `file_list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Page size for `file_list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Name of the folder `file_mkdir` creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,
    /// Id of the folder `file_move` moves to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to: Option<String>,
    /// Path of the folder `file_move` moves to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_path: Option<String>,
    /// New name for `file_rename`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

impl FileParam {
    /// Addresses the file or folder `id` of a group.
    pub fn group(group: i64, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: Some(group),
            ..Default::default()
        }
    }

    /// Addresses the file or folder `id` of a friend.
    pub fn friend(qq: i64, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            qq: Some(qq),
            ..Default::default()
        }
    }

    /// Requests download info.
    pub fn with_download_info(mut self) -> Self {
        self.with_download_info = true;
        self
    }

    /// Pages a listing.
    pub fn page(mut self, offset: u32, size: u32) -> Self {
        self.offset = Some(offset);
        self.size = Some(size);
        self
    }
}

/// Download details of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDownloadInfo {
    pub sha1: String,
    pub md5: String,
    pub download_times: i64,
    pub uploader_id: i64,
    pub upload_time: i64,
    pub last_modify_time: i64,
    pub url: String,
}

/// A file or folder in a group's file system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileInfo {
    /// File name.
    pub name: String,
    /// File id.
    pub id: String,
    /// Full path.
    pub path: String,
    /// Containing folder, `None` at the root.
    pub parent: Option<Box<FileInfo>>,
    /// Owning group.
    pub contact: Group,
    /// Whether this is a file.
    pub is_file: bool,
    /// Whether this is a folder.
    pub is_directory: bool,
    pub sha1: String,
    pub md5: String,
    pub download_times: i64,
    pub uploader_id: i64,
    pub upload_time: i64,
    pub last_modify_time: i64,
    /// Present only when requested with [`FileParam::with_download_info`].
    pub download_info: Option<FileDownloadInfo>,
}

// ============================================================================
// Request Responses
// ============================================================================

/// How to answer a [`NewFriendRequestEvent`](super::NewFriendRequestEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewFriendOperate {
    /// Accept.
    Accept,
    /// Decline.
    Decline,
    /// Decline and block further requests.
    DeclineAndBlock,
}

impl NewFriendOperate {
    /// Wire code of the operation.
    pub fn code(self) -> i32 {
        match self {
            Self::Accept => 0,
            Self::Decline => 1,
            Self::DeclineAndBlock => 2,
        }
    }
}

/// How to answer a [`MemberJoinRequestEvent`](super::MemberJoinRequestEvent).
/// The bot must be an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberJoinOperate {
    /// Accept.
    Accept,
    /// Decline.
    Decline,
    /// Leave the request pending.
    Ignore,
    /// Decline and block further requests.
    DeclineAndBlock,
    /// Ignore and block further requests.
    IgnoreAndBlock,
}

impl MemberJoinOperate {
    /// Wire code of the operation.
    pub fn code(self) -> i32 {
        match self {
            Self::Accept => 0,
            Self::Decline => 1,
            Self::Ignore => 2,
            Self::DeclineAndBlock => 3,
            Self::IgnoreAndBlock => 4,
        }
    }
}

/// How to answer a
/// [`BotInvitedJoinGroupRequestEvent`](super::BotInvitedJoinGroupRequestEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotInvitedOperate {
    /// Join the group.
    Accept,
    /// Decline the invitation.
    Decline,
}

impl BotInvitedOperate {
    /// Wire code of the operation.
    pub fn code(self) -> i32 {
        match self {
            Self::Accept => 0,
            Self::Decline => 1,
        }
    }
}

macro_rules! serialize_as_code {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_i32(self.code())
                }
            }
        )*
    };
}

serialize_as_code!(NewFriendOperate, MemberJoinOperate, BotInvitedOperate);

/// Content of the `resp_*` commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse<O: Serialize> {
    /// Event id from the request.
    pub event_id: i64,
    /// Requester id from the request.
    pub from_id: i64,
    /// Group id from the request.
    pub group_id: i64,
    /// The decision.
    pub operate: O,
    /// Reply message.
    pub message: String,
}

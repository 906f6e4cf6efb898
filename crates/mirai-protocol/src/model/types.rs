//! Contact types shared by messages, events and API responses.
//!
//! The server omits fields freely, so every contact deserializes leniently:
//! a missing field takes its default value. A contact that is not an object,
//! or whose fields have the wrong JSON type, still fails.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission of a member inside a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Perm {
    /// Group owner.
    Owner,
    /// Group administrator.
    Administrator,
    /// Regular member.
    #[default]
    Member,
}

/// Kind of a conversation subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A friend.
    #[default]
    Friend,
    /// A group.
    Group,
    /// A stranger.
    Stranger,
}

/// Whether a member gained or lost an honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HonorAction {
    /// Honor gained.
    Achieve,
    /// Honor lost.
    Lose,
}

/// Gender reported in a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    /// Not disclosed.
    #[default]
    Unknown,
    /// Male.
    Male,
    /// Female.
    Female,
}

/// A friend (also used for strangers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Friend {
    /// Account id.
    pub id: i64,
    /// Nickname.
    pub nickname: String,
    /// Remark set by the bot.
    pub remark: String,
}

impl fmt::Display for Friend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.nickname, self.id)
    }
}

/// A group, as seen by the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Group id.
    pub id: i64,
    /// Group name.
    pub name: String,
    /// The bot's own permission in this group.
    pub permission: Perm,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// A group member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Member {
    /// Account id.
    pub id: i64,
    /// Group card.
    pub member_name: String,
    /// Special title.
    pub special_title: String,
    /// Permission in the group.
    pub permission: Perm,
    /// Join time, unix seconds.
    pub join_timestamp: i64,
    /// Last message time, unix seconds.
    pub last_speak_timestamp: i64,
    /// Remaining mute time, seconds.
    pub mute_time_remaining: i64,
    /// The group this membership belongs to.
    pub group: Group,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.member_name, self.id)
    }
}

/// Another client logged into the bot's account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherClient {
    /// Client id.
    pub id: i64,
    /// Platform name.
    pub platform: String,
}

/// A user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Nickname.
    pub nickname: String,
    /// E-mail address.
    pub email: String,
    /// Age.
    pub age: i32,
    /// Account level.
    pub level: i32,
    /// Signature.
    pub sign: String,
    /// Gender.
    pub sex: Sex,
}

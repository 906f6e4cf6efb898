//! Notice events: changes to the bot, groups, members and friends.
//!
//! An `operator` that is `None` means the bot itself performed the action.

use serde::{Deserialize, Serialize};

use crate::model::types::{Group, HonorAction, Kind, Member, Perm};

// ============================================================================
// Bot Events
// ============================================================================

/// The bot's permission in a group changed. The operator is always the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotGroupPermissionChangeEvent {
    /// Previous permission.
    pub origin: Perm,
    /// New permission.
    pub current: Perm,
    /// The group.
    pub group: Group,
}

/// The bot was muted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMuteEvent {
    /// Mute duration in seconds.
    pub duration_seconds: i64,
    /// Who muted the bot.
    pub operator: Member,
}

/// The bot was unmuted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotUnmuteEvent {
    /// Who unmuted the bot.
    pub operator: Member,
}

/// The bot joined a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotJoinGroupEvent {
    /// The group.
    pub group: Group,
    /// Who invited the bot, if anyone.
    #[serde(default)]
    pub invitor: Option<Member>,
}

/// The bot left a group on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventActive {
    /// The group.
    pub group: Group,
}

/// The bot was kicked from a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventKick {
    /// The group.
    pub group: Group,
    /// Who kicked the bot.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// The bot left because the owner disbanded the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventDisband {
    /// The group.
    pub group: Group,
    /// The owner.
    #[serde(default)]
    pub operator: Option<Member>,
}

// ============================================================================
// Recall / Nudge
// ============================================================================

/// A group message was recalled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecallEvent {
    /// Sender of the recalled message.
    pub author_id: i64,
    /// Id of the recalled message.
    pub message_id: i64,
    /// Send time of the recalled message.
    pub time: i64,
    /// The group.
    pub group: Group,
    /// Who recalled it.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// A friend message was recalled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecallEvent {
    /// Sender of the recalled message.
    pub author_id: i64,
    /// Id of the recalled message.
    pub message_id: i64,
    /// Send time of the recalled message.
    pub time: i64,
    /// Friend or bot account id.
    pub operator: i64,
}

/// Where a nudge happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeSubject {
    /// Friend account id or group id.
    pub id: i64,
    /// Subject kind.
    pub kind: Kind,
}

/// Someone nudged someone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeEvent {
    /// Who nudged.
    pub from_id: i64,
    /// Where.
    pub subject: NudgeSubject,
    /// Action text.
    #[serde(default)]
    pub action: String,
    /// Custom suffix.
    #[serde(default)]
    pub suffix: String,
    /// Who was nudged.
    pub target: i64,
}

// ============================================================================
// Group Events
// ============================================================================

/// A group was renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNameChangeEvent {
    /// Previous name.
    pub origin: String,
    /// New name.
    pub current: String,
    /// The group.
    pub group: Group,
    /// Who renamed it.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// A group's entrance announcement changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntranceAnnouncementChangeEvent {
    /// Previous announcement.
    pub origin: String,
    /// New announcement.
    pub current: String,
    /// The group.
    pub group: Group,
    /// Who changed it.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// Mute-all was toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMuteAllEvent {
    /// Previous state.
    pub origin: bool,
    /// New state.
    pub current: bool,
    /// The group.
    pub group: Group,
    /// Who toggled it.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// Anonymous chat was toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAllowAnonymousChatEvent {
    /// Previous state.
    pub origin: bool,
    /// New state.
    pub current: bool,
    /// The group.
    pub group: Group,
    /// Who toggled it.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// Confess talk was toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAllowConfessTalkEvent {
    /// Previous state.
    pub origin: bool,
    /// New state.
    pub current: bool,
    /// The group.
    pub group: Group,
    /// Whether the bot made the change.
    #[serde(default)]
    pub is_by_bot: bool,
}

/// Member invitations were toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAllowMemberInviteEvent {
    /// Previous state.
    pub origin: bool,
    /// New state.
    pub current: bool,
    /// The group.
    pub group: Group,
    /// Who toggled it.
    #[serde(default)]
    pub operator: Option<Member>,
}

// ============================================================================
// Member Events
// ============================================================================

/// Someone joined a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberJoinEvent {
    /// The new member.
    pub member: Member,
    /// Who invited them, if anyone.
    #[serde(default)]
    pub invitor: Option<Member>,
}

/// A member (not the bot) was kicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLeaveEventKick {
    /// The kicked member.
    pub member: Member,
    /// Who kicked them.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// A member (not the bot) left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLeaveEventQuit {
    /// The member who left.
    pub member: Member,
}

/// A member's group card changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCardChangeEvent {
    /// Previous card.
    pub origin: String,
    /// New card.
    pub current: String,
    /// The member.
    pub member: Member,
}

/// A member's special title changed. Only the owner can do this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpecialTitleChangeEvent {
    /// Previous title.
    pub origin: String,
    /// New title.
    pub current: String,
    /// The member.
    pub member: Member,
}

/// A member's (not the bot's) permission changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPermissionChangeEvent {
    /// Previous permission.
    pub origin: Perm,
    /// New permission.
    pub current: Perm,
    /// The member.
    pub member: Member,
}

/// A member (not the bot) was muted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMuteEvent {
    /// Mute duration in seconds.
    pub duration_seconds: i64,
    /// The member.
    pub member: Member,
    /// Who muted them.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// A member (not the bot) was unmuted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUnmuteEvent {
    /// The member.
    pub member: Member,
    /// Who unmuted them.
    #[serde(default)]
    pub operator: Option<Member>,
}

/// A member gained or lost an honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberHonorChangeEvent {
    /// The member.
    pub member: Member,
    /// Gained or lost.
    pub action: HonorAction,
    /// Honor name.
    pub honor: String,
}

typed_events!(
    fn notice_decoders;
    BotGroupPermissionChangeEvent,
    BotMuteEvent,
    BotUnmuteEvent,
    BotJoinGroupEvent,
    BotLeaveEventActive,
    BotLeaveEventKick,
    BotLeaveEventDisband,
    GroupRecallEvent,
    FriendRecallEvent,
    NudgeEvent,
    GroupNameChangeEvent,
    GroupEntranceAnnouncementChangeEvent,
    GroupMuteAllEvent,
    GroupAllowAnonymousChatEvent,
    GroupAllowConfessTalkEvent,
    GroupAllowMemberInviteEvent,
    MemberJoinEvent,
    MemberLeaveEventKick,
    MemberLeaveEventQuit,
    MemberCardChangeEvent,
    MemberSpecialTitleChangeEvent,
    MemberPermissionChangeEvent,
    MemberMuteEvent,
    MemberUnmuteEvent,
    MemberHonorChangeEvent,
);

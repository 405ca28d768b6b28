//! Subscription model: one record per user per room, carrying that user's
//! notification preferences and a denormalized snapshot of the user itself.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::types::{RoomId, UserId};

/// Per-channel notification mode chosen by a user (or inherited).
///
/// A subscription with no explicit mode for a channel falls back to the
/// server-wide default; that absence is modeled as `Option<NotificationMode>`
/// on [`ChannelPreference`], not as a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationMode {
    /// Notify on every message.
    All,
    /// Notify only when mentioned.
    Mentions,
    /// Never notify on this channel.
    Nothing,
}

/// Where a channel preference value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceOrigin {
    /// Explicit personal override set by the user.
    User,
    /// Inherited from the server-wide default.
    Server,
}

/// One channel's preference on a subscription: the mode (if explicitly set)
/// and where it came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelPreference {
    pub mode: Option<NotificationMode>,
    pub origin: PreferenceOrigin,
}

impl ChannelPreference {
    /// No explicit setting; the server default applies.
    pub fn unset() -> Self {
        Self {
            mode: None,
            origin: PreferenceOrigin::Server,
        }
    }

    /// An explicit personal setting.
    pub fn user(mode: NotificationMode) -> Self {
        Self {
            mode: Some(mode),
            origin: PreferenceOrigin::User,
        }
    }

    /// A setting materialized from the server default (e.g. by an admin
    /// changing the default for existing subscriptions).
    pub fn server(mode: NotificationMode) -> Self {
        Self {
            mode: Some(mode),
            origin: PreferenceOrigin::Server,
        }
    }
}

impl Default for ChannelPreference {
    fn default() -> Self {
        Self::unset()
    }
}

/// User presence as shown to other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Away,
    Busy,
    Offline,
}

/// An email address on the receiver's account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    pub verified: bool,
}

/// Denormalized snapshot of the subscribing user, as joined into the
/// subscription by the store's candidate query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    /// Deactivated accounts are never notified.
    pub active: bool,
    pub username: String,
    pub name: Option<String>,
    pub language: Option<String>,
    /// Account email addresses, in account order.
    pub emails: Vec<EmailAddress>,
    /// User-visible presence (what the busy check reads).
    pub status: Presence,
    /// Realtime connection state (what the online/offline gates read).
    pub connection: Presence,
}

/// Per-user-per-room notification preferences plus the receiver snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub audio: ChannelPreference,
    pub desktop: ChannelPreference,
    pub mobile: ChannelPreference,
    pub email: ChannelPreference,
    /// Seconds a desktop popup stays visible, when the user overrode it.
    pub desktop_duration_secs: Option<u32>,
    /// Skip `@all` / `@here` notifications unless also directly mentioned.
    pub mute_group_mentions: bool,
    /// Keywords whose appearance in a message counts as a mention.
    pub highlights: Vec<String>,
    /// User turned off every notification for this room.
    pub disable_notifications: bool,
    /// Senders this user ignores.
    pub ignored: Vec<UserId>,
    pub receiver: Receiver,
}

impl Subscription {
    /// The preference for one channel.
    pub fn preference(&self, channel: Channel) -> ChannelPreference {
        match channel {
            Channel::Audio => self.audio,
            Channel::Desktop => self.desktop,
            Channel::Mobile => self.mobile,
            Channel::Email => self.email,
        }
    }
}

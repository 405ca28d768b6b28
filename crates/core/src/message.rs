//! Message model and mention analysis.

use serde::{Deserialize, Serialize};

use crate::types::{MessageId, RoomId, Timestamp, UserId};

/// Sentinel mention id addressing every member of a room.
pub const MENTION_ALL: &str = "all";

/// Sentinel mention id addressing currently-present members.
pub const MENTION_HERE: &str = "here";

/// A single `@mention` occurring in a message body.
///
/// `username` is what appears in the raw text; `name` is the full display
/// name used when the real-name setting substitutes mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
}

/// A chat message as handed to the engine by the persistence pipeline.
///
/// Immutable from the engine's point of view; the fan-out never alters it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub text: String,
    pub ts: Timestamp,
    /// Set when the message has been edited; edited messages are not re-notified.
    pub edited_at: Option<Timestamp>,
    /// Mentions in the order they appear in the body.
    pub mentions: Vec<Mention>,
}

// ---------------------------------------------------------------------------
// MentionSet
// ---------------------------------------------------------------------------

/// Precomputed view over a message's mentions.
///
/// Separates the group sentinels (`@all` / `@here`) from real user ids so the
/// eligibility query and channel policy can test both cheaply.
#[derive(Debug, Clone, Default)]
pub struct MentionSet {
    /// Every mentioned id, sentinels included, in message order.
    pub ids: Vec<UserId>,
    /// Mentioned user ids with the group sentinels removed.
    pub user_ids: Vec<UserId>,
    /// Message carries an `@all` mention.
    pub has_all: bool,
    /// Message carries an `@here` mention.
    pub has_here: bool,
}

impl MentionSet {
    /// Analyze the mentions of a message.
    pub fn of(message: &Message) -> Self {
        let ids: Vec<UserId> = message.mentions.iter().map(|m| m.id.clone()).collect();
        let user_ids = ids
            .iter()
            .filter(|id| id.as_str() != MENTION_ALL && id.as_str() != MENTION_HERE)
            .cloned()
            .collect();
        Self {
            has_all: ids.iter().any(|id| id == MENTION_ALL),
            has_here: ids.iter().any(|id| id == MENTION_HERE),
            ids,
            user_ids,
        }
    }

    /// Whether the given user is directly mentioned (sentinels never match a
    /// real user id, so testing the full list is equivalent and cheaper).
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.ids.iter().any(|id| id == user_id)
    }

    /// Whether the message carries any group mention.
    pub fn has_group_mention(&self) -> bool {
        self.has_all || self.has_here
    }
}

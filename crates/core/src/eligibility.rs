//! Candidate selection for a message's fan-out.
//!
//! [`EligibilityQuery`] describes, as data, which subscriptions of a room
//! could receive at least one notification for a message. The subscription
//! store translates it into its native query language; in-memory stores and
//! tests evaluate it directly with [`EligibilityQuery::matches`], which is
//! the reference semantics either way.
//!
//! Every subscription the query admits satisfies at least one inclusion
//! clause, so the per-channel decision functions only ever run on plausible
//! candidates.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::message::MentionSet;
use crate::room::{Room, RoomKind};
use crate::settings::ChannelDefaults;
use crate::subscription::{NotificationMode, PreferenceOrigin, Subscription};
use crate::types::{RoomId, UserId};

/// One OR-branch of the candidate query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InclusionClause {
    /// The subscription carries at least one highlight keyword. Such users
    /// are always candidates so the highlight match can be evaluated against
    /// the message text.
    HasHighlights,

    /// The channel mode is explicitly `all`. While room-size suppression is
    /// active only explicit personal overrides qualify; server-default
    /// sourced `all` settings are suppressed.
    ModeAll {
        channel: Channel,
        require_user_origin: bool,
    },

    /// The channel mode is explicitly `mentions`. With `user_ids` present the
    /// clause admits only those users (direct mentions); without it, any
    /// mentions-mode subscription qualifies (group mention fallback).
    ModeMentions {
        channel: Channel,
        user_ids: Option<Vec<UserId>>,
    },

    /// No explicit mode for the channel — the server default applies. With
    /// `user_ids` present the clause admits only those users (server default
    /// `mentions` + direct mention).
    ModeUnset {
        channel: Channel,
        user_ids: Option<Vec<UserId>>,
    },
}

impl InclusionClause {
    /// Whether one subscription satisfies this clause.
    fn admits(&self, sub: &Subscription) -> bool {
        match self {
            InclusionClause::HasHighlights => !sub.highlights.is_empty(),

            InclusionClause::ModeAll {
                channel,
                require_user_origin,
            } => {
                let pref = sub.preference(*channel);
                pref.mode == Some(NotificationMode::All)
                    && (!require_user_origin || pref.origin == PreferenceOrigin::User)
            }

            InclusionClause::ModeMentions { channel, user_ids } => {
                sub.preference(*channel).mode == Some(NotificationMode::Mentions)
                    && user_ids
                        .as_ref()
                        .is_none_or(|ids| ids.contains(&sub.user_id))
            }

            InclusionClause::ModeUnset { channel, user_ids } => {
                sub.preference(*channel).mode.is_none()
                    && user_ids
                        .as_ref()
                        .is_none_or(|ids| ids.contains(&sub.user_id))
            }
        }
    }
}

/// The candidate query for one message: base exclusions plus an
/// OR-combination of inclusion clauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityQuery {
    pub room_id: RoomId,
    /// Subscriptions whose user ignores this sender are excluded.
    pub sender_id: UserId,
    pub clauses: Vec<InclusionClause>,
}

impl EligibilityQuery {
    /// Build the candidate query for one message.
    ///
    /// `suppressed` is the room-size suppression flag; `defaults` the current
    /// server default mode per channel. Built fresh per message and never
    /// persisted.
    pub fn build(
        room: &Room,
        sender_id: &str,
        mentions: &MentionSet,
        suppressed: bool,
        defaults: &ChannelDefaults,
    ) -> Self {
        let is_direct = room.kind == Some(RoomKind::Direct);
        let mut clauses = vec![InclusionClause::HasHighlights];

        for channel in Channel::ALL {
            // Explicit `all`, minus default-sourced settings while suppressed.
            clauses.push(InclusionClause::ModeAll {
                channel,
                require_user_origin: suppressed,
            });

            // Explicit `mentions`: directly mentioned users, or — when the
            // message only carries a group mention — every mentions-mode
            // subscription, unless suppressed.
            if !mentions.user_ids.is_empty() {
                clauses.push(InclusionClause::ModeMentions {
                    channel,
                    user_ids: Some(mentions.user_ids.clone()),
                });
            } else if !suppressed && mentions.has_group_mention() {
                clauses.push(InclusionClause::ModeMentions {
                    channel,
                    user_ids: None,
                });
            }

            // No explicit mode: the server default decides. Direct rooms
            // ignore room-size suppression here entirely.
            let default = defaults.for_channel(channel);
            if (is_direct && default != NotificationMode::Nothing)
                || (!suppressed
                    && (default == NotificationMode::All || mentions.has_group_mention()))
            {
                clauses.push(InclusionClause::ModeUnset {
                    channel,
                    user_ids: None,
                });
            } else if default == NotificationMode::Mentions && !mentions.user_ids.is_empty() {
                clauses.push(InclusionClause::ModeUnset {
                    channel,
                    user_ids: Some(mentions.user_ids.clone()),
                });
            }
        }

        Self {
            room_id: room.id.clone(),
            sender_id: sender_id.to_string(),
            clauses,
        }
    }

    /// Reference evaluation of the query against one subscription.
    pub fn matches(&self, sub: &Subscription) -> bool {
        if sub.room_id != self.room_id {
            return false;
        }
        if !sub.receiver.active {
            return false;
        }
        if sub.disable_notifications {
            return false;
        }
        if sub.ignored.contains(&self.sender_id) {
            return false;
        }
        self.clauses.iter().any(|clause| clause.admits(sub))
    }
}

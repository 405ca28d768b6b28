//! Per-channel notification decision functions.
//!
//! Four pure predicates, one per [`Channel`](crate::channel::Channel), each
//! deciding whether that channel fires for one recipient of one message. The
//! dispatcher evaluates each exactly once per recipient; nothing here has
//! side effects.
//!
//! Shared gate order:
//!
//! 1. an explicit `nothing` mode never fires;
//! 2. room-size suppression silences recipients with no explicit mode;
//! 3. a channel-specific presence gate (see each predicate);
//! 4. no explicit mode + server default `all` always fires;
//! 5. otherwise: direct-message room, a qualifying group mention while not
//!    suppressed, a highlight match, an explicit `all` mode, or a direct
//!    mention.
//!
//! The sender-is-recipient exclusion is enforced by the dispatcher, not
//! repeated in each predicate.

use crate::room::RoomKind;
use crate::subscription::{NotificationMode, Presence};

/// Everything a channel decision needs to know about one recipient of one
/// message.
///
/// `mode` and `server_default` are the values for the channel being decided;
/// the dispatcher builds one context per channel.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext {
    /// Room-size suppression is active for this message.
    pub suppressed: bool,
    /// Recipient's user-visible presence.
    pub status: Presence,
    /// Recipient's realtime connection state.
    pub connection: Presence,
    /// The recipient's explicit mode for this channel, if any.
    pub mode: Option<NotificationMode>,
    /// The server default mode for this channel.
    pub server_default: NotificationMode,
    pub has_mention_to_all: bool,
    pub has_mention_to_here: bool,
    pub is_highlighted: bool,
    pub has_mention_to_user: bool,
    pub room_kind: RoomKind,
}

impl DecisionContext {
    /// Gates 1, 2 and 4 of the shared shape; `None` means the decision falls
    /// through to the channel's catch-all.
    fn common_gates(&self) -> Option<bool> {
        if self.mode == Some(NotificationMode::Nothing) {
            return Some(false);
        }
        if self.suppressed && self.mode.is_none() {
            return Some(false);
        }
        if self.mode.is_none() && self.server_default == NotificationMode::All {
            return Some(true);
        }
        None
    }

    /// Gate 5: reasons that fire a channel regardless of the default.
    ///
    /// `group_mention` is channel-specific: audio and desktop honor both
    /// `@all` and `@here`, mobile and email only `@all`.
    fn catch_all(&self, group_mention: bool) -> bool {
        self.room_kind == RoomKind::Direct
            || (!self.suppressed && group_mention)
            || self.is_highlighted
            || self.mode == Some(NotificationMode::All)
            || self.has_mention_to_user
    }
}

/// Should an audio alert play for this recipient?
///
/// Busy recipients never get audio, nor do recipients with no realtime
/// connection (there is no client to play the sound).
pub fn should_notify_audio(ctx: &DecisionContext) -> bool {
    if ctx.connection == Presence::Offline || ctx.status == Presence::Busy {
        return false;
    }
    if let Some(decided) = ctx.common_gates() {
        return decided;
    }
    ctx.catch_all(ctx.has_mention_to_all || ctx.has_mention_to_here)
}

/// Should a desktop popup be pushed to this recipient?
///
/// Same presence rules as audio: busy or disconnected recipients are skipped.
pub fn should_notify_desktop(ctx: &DecisionContext) -> bool {
    if ctx.connection == Presence::Offline || ctx.status == Presence::Busy {
        return false;
    }
    if let Some(decided) = ctx.common_gates() {
        return decided;
    }
    ctx.catch_all(ctx.has_mention_to_all || ctx.has_mention_to_here)
}

/// Should a mobile push go out to this recipient?
///
/// Push targets recipients who are not actively connected; `@here` never
/// triggers mobile push, only `@all`, highlights, and direct mentions.
pub fn should_notify_mobile(ctx: &DecisionContext) -> bool {
    if ctx.connection == Presence::Online {
        return false;
    }
    if let Some(decided) = ctx.common_gates() {
        return decided;
    }
    ctx.catch_all(ctx.has_mention_to_all)
}

/// Should an email be sent to this recipient?
///
/// Email goes only to recipients without an active connection, and like
/// mobile push ignores `@here`.
pub fn should_notify_email(ctx: &DecisionContext) -> bool {
    if ctx.connection == Presence::Online {
        return false;
    }
    if let Some(decided) = ctx.common_gates() {
        return decided;
    }
    ctx.catch_all(ctx.has_mention_to_all)
}

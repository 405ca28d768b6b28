//! Per-recipient dispatch: skip checks, the four channel decisions, and the
//! actual send calls.

use std::sync::Arc;

use roomcast_core::message::{MentionSet, Message};
use roomcast_core::permissions::VIEW_DIRECT_ROOM;
use roomcast_core::policy::{
    should_notify_audio, should_notify_desktop, should_notify_email, should_notify_mobile,
    DecisionContext,
};
use roomcast_core::room::{Room, RoomKind};
use roomcast_core::settings::ChannelDefaults;
use roomcast_core::subscription::Subscription;
use roomcast_core::text::contains_highlight;
use roomcast_core::user::User;
use roomcast_core::Channel;

use crate::collaborators::{
    AudioAlert, ChannelSenders, DesktopNotification, EmailNotification, NotificationRenderer,
    PermissionChecker, PushNotification, SentKind, SentSignal, SideChannel,
};
use crate::error::CollaboratorError;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Everything the dispatcher needs for one recipient of one message.
pub struct DispatchRequest<'a> {
    pub subscription: &'a Subscription,
    pub sender: &'a User,
    pub message: &'a Message,
    pub room: &'a Room,
    /// The room kind, already validated by the orchestrator's guard.
    pub room_kind: RoomKind,
    /// Base notification text after transforms and mention substitution.
    pub base_text: &'a str,
    pub mentions: &'a MentionSet,
    /// Room-size suppression flag (forced off for freshly auto-joined
    /// mentioned users).
    pub suppressed: bool,
    pub defaults: ChannelDefaults,
}

/// Why a recipient was silently skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientSkip {
    /// The subscription belongs to the message sender.
    Sender,
    /// Group mention with `mute_group_mentions` set and no direct mention.
    MutedGroupMention,
    /// Direct-message room and the recipient lacks the view permission.
    MissingPermission,
}

/// Which channels fired for a recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentChannels {
    pub audio: bool,
    pub desktop: bool,
    pub mobile: bool,
    pub email: bool,
}

impl SentChannels {
    /// At least one channel fired.
    pub fn any(&self) -> bool {
        self.audio || self.desktop || self.mobile || self.email
    }
}

/// Outcome of dispatching one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Skipped(RecipientSkip),
    Sent(SentChannels),
}

// ---------------------------------------------------------------------------
// RecipientDispatcher
// ---------------------------------------------------------------------------

/// Runs the four channel decisions for one recipient and invokes the
/// matching transports. Holds only shared collaborator handles, so one
/// dispatcher serves any number of concurrent fan-outs.
pub struct RecipientDispatcher {
    permissions: Arc<dyn PermissionChecker>,
    renderer: Arc<dyn NotificationRenderer>,
    senders: ChannelSenders,
    side_channel: Arc<dyn SideChannel>,
}

impl RecipientDispatcher {
    pub fn new(
        permissions: Arc<dyn PermissionChecker>,
        renderer: Arc<dyn NotificationRenderer>,
        senders: ChannelSenders,
        side_channel: Arc<dyn SideChannel>,
    ) -> Self {
        Self {
            permissions,
            renderer,
            senders,
            side_channel,
        }
    }

    /// Dispatch one recipient.
    ///
    /// Each channel decision is evaluated exactly once, in the fixed order
    /// audio → desktop → mobile → email, so a recipient receives at most one
    /// send per channel per message. Transport errors propagate to the
    /// caller, which isolates them per recipient.
    pub async fn dispatch(
        &self,
        req: DispatchRequest<'_>,
    ) -> Result<DispatchResult, CollaboratorError> {
        let sub = req.subscription;

        // Never notify the sender of their own message.
        if sub.user_id == req.sender.id {
            return Ok(DispatchResult::Skipped(RecipientSkip::Sender));
        }

        let has_mention_to_user = req.mentions.mentions_user(&sub.user_id);

        // Group mentions can be muted per subscription, unless the user is
        // also mentioned directly.
        if !has_mention_to_user && sub.mute_group_mentions && req.mentions.has_group_mention() {
            return Ok(DispatchResult::Skipped(RecipientSkip::MutedGroupMention));
        }

        // Direct-message rooms require the view permission.
        if req.room_kind == RoomKind::Direct
            && !self
                .permissions
                .has_permission(&sub.user_id, VIEW_DIRECT_ROOM, Some(&req.room.id))
                .await?
        {
            return Ok(DispatchResult::Skipped(RecipientSkip::MissingPermission));
        }

        let text = self
            .renderer
            .render(req.base_text, req.message, &sub.receiver);
        let is_highlighted = contains_highlight(&req.message.text, &sub.highlights);

        let ctx_for = |channel: Channel| DecisionContext {
            suppressed: req.suppressed,
            status: sub.receiver.status,
            connection: sub.receiver.connection,
            mode: sub.preference(channel).mode,
            server_default: req.defaults.for_channel(channel),
            has_mention_to_all: req.mentions.has_all,
            has_mention_to_here: req.mentions.has_here,
            is_highlighted,
            has_mention_to_user,
            room_kind: req.room_kind,
        };

        let mut sent = SentChannels::default();

        if should_notify_audio(&ctx_for(Channel::Audio)) {
            self.senders
                .audio
                .send(AudioAlert {
                    user_id: sub.user_id.clone(),
                    message_id: req.message.id.clone(),
                    room_id: req.room.id.clone(),
                })
                .await?;
            sent.audio = true;
        }

        if should_notify_desktop(&ctx_for(Channel::Desktop)) {
            self.senders
                .desktop
                .send(DesktopNotification {
                    user_id: sub.user_id.clone(),
                    message_id: req.message.id.clone(),
                    room_id: req.room.id.clone(),
                    text: text.clone(),
                    sender: req.sender.clone(),
                    duration_secs: sub.desktop_duration_secs,
                })
                .await?;
            sent.desktop = true;
        }

        if should_notify_mobile(&ctx_for(Channel::Mobile)) {
            self.senders
                .mobile
                .send(PushNotification {
                    user_id: sub.user_id.clone(),
                    message_id: req.message.id.clone(),
                    room_id: req.room.id.clone(),
                    room_name: req.room.name.clone(),
                    text: text.clone(),
                    sender_username: req.sender.username.clone(),
                    sender_name: req.sender.name.clone(),
                    receiver_username: sub.receiver.username.clone(),
                })
                .await?;
            sent.mobile = true;
        }

        if should_notify_email(&ctx_for(Channel::Email)) {
            // Only the first verified address, in account order, gets the
            // email; no verified address means no send.
            if let Some(email) = sub.receiver.emails.iter().find(|e| e.verified) {
                self.senders
                    .email
                    .send(EmailNotification {
                        user_id: sub.user_id.clone(),
                        message_id: req.message.id.clone(),
                        room_id: req.room.id.clone(),
                        room_name: req.room.name.clone(),
                        address: email.address.clone(),
                        text: text.clone(),
                        direct_mention: has_mention_to_user,
                        language: sub.receiver.language.clone(),
                    })
                    .await?;
                sent.email = true;
            }
        }

        // Audio and email do not count as a synchronous client notification.
        if sent.desktop || sent.mobile {
            self.signal_sent(req.room_kind, req.sender, req.message, &sub.user_id);
        }

        Ok(DispatchResult::Sent(sent))
    }

    /// Submit the "notification sent" signal without awaiting it. Errors are
    /// logged in the spawned task; they never affect the dispatch.
    fn signal_sent(&self, room_kind: RoomKind, sender: &User, message: &Message, user_id: &str) {
        let signal = SentSignal {
            message_id: message.id.clone(),
            user_id: user_id.to_string(),
            summary: format!("@{}: {}", sender.username, message.text),
            kind: if room_kind == RoomKind::Private {
                SentKind::PrivateMessage
            } else {
                SentKind::Message
            },
        };
        let side_channel = Arc::clone(&self.side_channel);
        tokio::spawn(async move {
            if let Err(e) = side_channel.notify_sent(signal).await {
                tracing::error!(error = %e, "Side-channel notify failed");
            }
        });
    }
}

//! Collaborator trait seams and channel payloads.
//!
//! Everything the engine touches outside its own process — subscription and
//! settings lookups, permission checks, the four delivery transports, the
//! room-join side effect, text rendering, and the "notification sent" side
//! channel — is injected through these traits at construction time. The
//! engine holds them as `Arc<dyn ...>` and never reaches for global state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use roomcast_core::eligibility::EligibilityQuery;
use roomcast_core::message::Message;
use roomcast_core::room::RoomKind;
use roomcast_core::settings::ChannelDefaults;
use roomcast_core::subscription::{Receiver, Subscription};
use roomcast_core::types::{MessageId, RoomId, UserId};
use roomcast_core::user::User;

use crate::error::CollaboratorError;

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Read access to subscription records.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Number of subscriptions (members) in a room.
    async fn count_by_room(&self, room_id: &str) -> Result<u64, CollaboratorError>;

    /// All subscriptions admitted by the candidate query.
    async fn find_eligible(
        &self,
        query: &EligibilityQuery,
    ) -> Result<Vec<Subscription>, CollaboratorError>;

    /// Subscriptions in a room held by any of the given users.
    async fn find_by_room_and_users(
        &self,
        room_id: &str,
        user_ids: &[UserId],
    ) -> Result<Vec<Subscription>, CollaboratorError>;

    /// One user's subscription to a room, if they have one.
    async fn find_one(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<Subscription>, CollaboratorError>;
}

/// Live server-wide settings reads.
///
/// Implementations are expected to be cheap (an in-memory settings cache);
/// values are read fresh on every fan-out so admin changes apply immediately.
pub trait SettingsReader: Send + Sync {
    /// Default notification mode per channel.
    fn channel_defaults(&self) -> ChannelDefaults;

    /// Room-size cap above which default-sourced notifications are
    /// suppressed. Zero disables the cap.
    fn max_room_members(&self) -> u64;

    /// Substitute full display names for `@mentions` in notification text.
    fn use_real_names(&self) -> bool;
}

/// Authorization checks, delegated entirely.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn has_permission(
        &self,
        user_id: &str,
        permission: &str,
        room_id: Option<&str>,
    ) -> Result<bool, CollaboratorError>;
}

/// Resolves the sending user for a message, per room type.
#[async_trait]
pub trait SenderResolver: Send + Sync {
    /// `None` when the sender does not exist or may not post in rooms of
    /// this kind; the fan-out is then skipped.
    async fn resolve(
        &self,
        room_kind: RoomKind,
        user_id: &str,
    ) -> Result<Option<User>, CollaboratorError>;
}

/// The room-join side effect used by the auto-join workflow.
#[async_trait]
pub trait RoomJoiner: Send + Sync {
    async fn join(&self, user_id: &str, room_id: &str) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Channel payloads
// ---------------------------------------------------------------------------

/// Payload for an in-client audio alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAlert {
    pub user_id: UserId,
    pub message_id: MessageId,
    pub room_id: RoomId,
}

/// Payload for a desktop popup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopNotification {
    pub user_id: UserId,
    pub message_id: MessageId,
    pub room_id: RoomId,
    /// Per-recipient rendered notification text.
    pub text: String,
    pub sender: User,
    /// Seconds the popup stays visible, when the recipient overrode it.
    pub duration_secs: Option<u32>,
}

/// Payload for a mobile push notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotification {
    pub user_id: UserId,
    pub message_id: MessageId,
    pub room_id: RoomId,
    pub room_name: Option<String>,
    pub text: String,
    pub sender_username: String,
    pub sender_name: Option<String>,
    pub receiver_username: String,
}

/// Payload for a notification email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailNotification {
    pub user_id: UserId,
    pub message_id: MessageId,
    pub room_id: RoomId,
    pub room_name: Option<String>,
    /// The recipient's first verified address.
    pub address: String,
    pub text: String,
    /// Recipient was mentioned directly (affects subject rendering
    /// downstream).
    pub direct_mention: bool,
    /// Recipient's preferred language, for downstream templating.
    pub language: Option<String>,
}

// ---------------------------------------------------------------------------
// Channel senders
// ---------------------------------------------------------------------------

/// Audio alert transport.
#[async_trait]
pub trait AudioSender: Send + Sync {
    async fn send(&self, alert: AudioAlert) -> Result<(), CollaboratorError>;
}

/// Desktop popup transport (realtime connection).
#[async_trait]
pub trait DesktopSender: Send + Sync {
    async fn send(&self, notification: DesktopNotification) -> Result<(), CollaboratorError>;
}

/// Mobile push gateway.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, notification: PushNotification) -> Result<(), CollaboratorError>;
}

/// Email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, notification: EmailNotification) -> Result<(), CollaboratorError>;
}

/// The four delivery transports, bundled for injection.
#[derive(Clone)]
pub struct ChannelSenders {
    pub audio: std::sync::Arc<dyn AudioSender>,
    pub desktop: std::sync::Arc<dyn DesktopSender>,
    pub mobile: std::sync::Arc<dyn PushSender>,
    pub email: std::sync::Arc<dyn EmailSender>,
}

// ---------------------------------------------------------------------------
// Text and side-channel hooks
// ---------------------------------------------------------------------------

/// Per-recipient personalization of the notification text (language-aware
/// rendering lives in the implementation, not here).
pub trait NotificationRenderer: Send + Sync {
    fn render(&self, base_text: &str, message: &Message, receiver: &Receiver) -> String;
}

/// Renderer that uses the base text unchanged.
pub struct PlainRenderer;

impl NotificationRenderer for PlainRenderer {
    fn render(&self, base_text: &str, _message: &Message, _receiver: &Receiver) -> String {
        base_text.to_string()
    }
}

/// An ordered, synchronous transform applied to the base notification text
/// before any recipient is dispatched. This is the explicit replacement for
/// implicit before-send hook registration.
pub trait MessageTransform: Send + Sync {
    fn apply(&self, text: String, message: &Message) -> String;
}

/// Visibility tag on the "notification sent" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentKind {
    /// The room is a private group.
    PrivateMessage,
    /// Any other room kind.
    Message,
}

/// The opaque "a synchronous notification went out" signal, fired when a
/// desktop or mobile send occurred for a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentSignal {
    pub message_id: MessageId,
    pub user_id: UserId,
    /// `@sender: message text` summary line.
    pub summary: String,
    pub kind: SentKind,
}

/// Side channel receiving [`SentSignal`]s. Invoked fire-and-forget: the
/// dispatcher never awaits completion, and errors go to the log.
#[async_trait]
pub trait SideChannel: Send + Sync {
    async fn notify_sent(&self, signal: SentSignal) -> Result<(), CollaboratorError>;
}

//! Roomcast notification fan-out engine.
//!
//! Invoked by the message-persistence pipeline once per saved message:
//! [`NotificationEngine::fan_out`] decides which room members and mentioned
//! users are notified on which channels (audio, desktop, mobile push, email)
//! and drives the injected transports — exactly once per eligible channel per
//! recipient, never the sender. The pure decision logic lives in
//! `roomcast-core`; this crate owns the async orchestration:
//!
//! - [`collaborators`] — the injected trait seams (stores, settings,
//!   permissions, transports, join, rendering, side channel).
//! - [`dispatch`] — per-recipient skip checks and channel sends.
//! - [`engine`] — the guard → prepare → dispatch → auto-join flow.

pub mod collaborators;
pub mod dispatch;
pub mod engine;
pub mod error;

pub use collaborators::{
    AudioAlert, AudioSender, ChannelSenders, DesktopNotification, DesktopSender,
    EmailNotification, EmailSender, MessageTransform, NotificationRenderer, PermissionChecker,
    PlainRenderer, PushNotification, PushSender, RoomJoiner, SenderResolver, SentKind, SentSignal,
    SettingsReader, SideChannel, SubscriptionStore,
};
pub use dispatch::{DispatchRequest, DispatchResult, RecipientDispatcher, RecipientSkip, SentChannels};
pub use engine::{FanoutReport, NotificationEngine, Outcome, SkipReason};
pub use error::{CollaboratorError, FanoutError};

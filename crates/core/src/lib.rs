//! Roomcast domain types and decision logic.
//!
//! Everything in this crate is pure and synchronous: message/room/subscription
//! models, the per-channel notification policy, and the eligibility query that
//! selects notification candidates for a message. The async orchestration that
//! drives these against live stores and transports lives in `roomcast-engine`.

pub mod channel;
pub mod eligibility;
pub mod message;
pub mod permissions;
pub mod policy;
pub mod room;
pub mod settings;
pub mod subscription;
pub mod text;
pub mod types;
pub mod user;

pub use channel::Channel;
pub use eligibility::EligibilityQuery;
pub use message::{Mention, MentionSet, Message};
pub use policy::{
    should_notify_audio, should_notify_desktop, should_notify_email, should_notify_mobile,
    DecisionContext,
};
pub use room::{Room, RoomKind};
pub use settings::ChannelDefaults;
pub use subscription::{
    ChannelPreference, EmailAddress, NotificationMode, PreferenceOrigin, Presence, Receiver,
    Subscription,
};
pub use user::User;

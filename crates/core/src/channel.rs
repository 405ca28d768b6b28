//! Notification delivery channels.
//!
//! The engine evaluates channels in the fixed order of [`Channel::ALL`] for
//! every recipient; the string codes match the values used by subscription
//! records and the settings store.

use serde::{Deserialize, Serialize};

/// A notification delivery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// In-client audio alert.
    Audio,
    /// Desktop popup pushed over the realtime connection.
    Desktop,
    /// Mobile push notification.
    Mobile,
    /// Email.
    Email,
}

impl Channel {
    /// All channels, in dispatch evaluation order.
    pub const ALL: [Channel; 4] = [
        Channel::Audio,
        Channel::Desktop,
        Channel::Mobile,
        Channel::Email,
    ];

    /// Stable string code for settings keys and logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Audio => "audio",
            Channel::Desktop => "desktop",
            Channel::Mobile => "mobile",
            Channel::Email => "email",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

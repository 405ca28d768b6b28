//! Server-wide default notification preferences.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::subscription::NotificationMode;

/// The server default mode for each channel, applied to subscriptions with no
/// explicit setting.
///
/// The settings store keys the email default under a differently-named entry
/// than the other three; translating store keys to this struct is the
/// settings reader's job, so the engine never sees the naming quirk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelDefaults {
    pub audio: NotificationMode,
    pub desktop: NotificationMode,
    pub mobile: NotificationMode,
    pub email: NotificationMode,
}

impl ChannelDefaults {
    /// The default for one channel.
    pub fn for_channel(&self, channel: Channel) -> NotificationMode {
        match channel {
            Channel::Audio => self.audio,
            Channel::Desktop => self.desktop,
            Channel::Mobile => self.mobile,
            Channel::Email => self.email,
        }
    }
}

impl Default for ChannelDefaults {
    /// Out of the box every channel defaults to notify-on-mention.
    fn default() -> Self {
        Self {
            audio: NotificationMode::Mentions,
            desktop: NotificationMode::Mentions,
            mobile: NotificationMode::Mentions,
            email: NotificationMode::Mentions,
        }
    }
}

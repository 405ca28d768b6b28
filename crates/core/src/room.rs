//! Room model.

use serde::{Deserialize, Serialize};

use crate::types::RoomId;

/// Room flavor, stored as a one-letter code by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// One-to-one direct message room (`"d"`).
    Direct,
    /// Invite-only private group (`"p"`).
    Private,
    /// Public channel (`"c"`).
    Channel,
}

impl RoomKind {
    /// Parse the persistence-layer code. Unknown codes yield `None`; the
    /// engine treats rooms of unknown kind as out of scope.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "d" => Some(RoomKind::Direct),
            "p" => Some(RoomKind::Private),
            "c" => Some(RoomKind::Channel),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            RoomKind::Direct => "d",
            RoomKind::Private => "p",
            RoomKind::Channel => "c",
        }
    }
}

/// A room, read-only to the notification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// `None` when the stored type code is missing or unrecognized.
    pub kind: Option<RoomKind>,
    pub name: Option<String>,
}

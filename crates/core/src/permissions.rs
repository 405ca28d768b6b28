//! Well-known permission name constants checked by the engine.

/// Required to receive notifications for direct-message rooms.
pub const VIEW_DIRECT_ROOM: &str = "view-d-room";

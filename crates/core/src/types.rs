/// Chat entity ids are opaque strings assigned by the persistence layer.
///
/// User ids share their id space with the group mention sentinels
/// (`"all"` / `"here"`), which is why this is not a numeric key.
pub type UserId = String;

/// Room (channel / group / direct-message) id.
pub type RoomId = String;

/// Message id.
pub type MessageId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

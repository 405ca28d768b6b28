//! Minimal user record, as resolved for a message sender.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A user referenced by the engine (most prominently the message sender).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Full display name, when the account has one.
    pub name: Option<String>,
}

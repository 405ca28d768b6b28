//! Engine error types.

use roomcast_core::types::UserId;

/// Error type collaborator implementations return. The engine never inspects
/// these beyond logging and aggregation.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by a fan-out run.
///
/// Guard rejections (edited / stale message, unknown room) are not errors —
/// they are [`Outcome::Skipped`](crate::engine::Outcome). Per-recipient
/// delivery failures are isolated, logged, and counted in the report rather
/// than surfaced here.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// The subscription store failed while computing the candidate set or
    /// resolving membership.
    #[error("subscription store failure: {0}")]
    Store(#[source] CollaboratorError),

    /// The sender could not be resolved for the room type.
    #[error("sender resolution failure: {0}")]
    Resolve(#[source] CollaboratorError),

    /// One or more auto-join attempts failed. Joins and notifications for
    /// the other mentioned users, and everything dispatched before the
    /// auto-join state, are unaffected.
    #[error("{} of {attempted} auto-join attempts failed", errors.len())]
    AutoJoin {
        /// How many users the batch tried to join.
        attempted: usize,
        /// The users whose join (or post-join lookup) failed, with causes.
        errors: Vec<(UserId, CollaboratorError)>,
    },
}

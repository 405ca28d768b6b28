//! Fan-out orchestration: guard, preparation, dispatch, and the auto-join
//! workflow for mentioned non-members.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;

use roomcast_core::eligibility::EligibilityQuery;
use roomcast_core::message::{MentionSet, Message};
use roomcast_core::room::{Room, RoomKind};
use roomcast_core::settings::ChannelDefaults;
use roomcast_core::text::replace_mentions_with_names;
use roomcast_core::types::UserId;
use roomcast_core::user::User;

use crate::collaborators::{
    ChannelSenders, MessageTransform, NotificationRenderer, PermissionChecker, RoomJoiner,
    SenderResolver, SettingsReader, SideChannel, SubscriptionStore,
};
use crate::dispatch::{DispatchRequest, DispatchResult, RecipientDispatcher};
use crate::error::{CollaboratorError, FanoutError};

/// Staleness window: messages whose timestamp is further than this from the
/// current wall clock (either direction, tolerating skew) are not notified.
const MAX_MESSAGE_AGE_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a fan-out run ended without dispatching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The message is an edit; edits are never re-notified.
    Edited,
    /// The message timestamp is outside the staleness window.
    Stale,
    /// The room is missing a recognized type.
    UnknownRoomKind,
    /// The sender could not be resolved for the room type.
    UnresolvedSender,
}

/// Counters from a completed fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Subscriptions admitted by the eligibility query.
    pub candidates: usize,
    /// Recipients for whom at least one channel fired.
    pub dispatched: usize,
    /// Recipients whose dispatch failed (isolated; see the log).
    pub failed: usize,
    /// Mentioned non-members successfully joined to the room.
    pub auto_joined: usize,
}

/// Result of one fan-out run. The message itself is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A guard rejected the message; nothing was dispatched.
    Skipped(SkipReason),
    /// The dispatch (and auto-join, where applicable) ran to completion.
    Completed(FanoutReport),
}

/// What the auto-join state produced, before merging into the report.
#[derive(Default)]
struct AutoJoinOutcome {
    attempted: usize,
    joined: usize,
    dispatched: usize,
    failed: usize,
    errors: Vec<(UserId, CollaboratorError)>,
}

// ---------------------------------------------------------------------------
// NotificationEngine
// ---------------------------------------------------------------------------

/// The per-message notification fan-out engine.
///
/// Holds only shared collaborator handles; share it behind an `Arc` and call
/// [`fan_out`](NotificationEngine::fan_out) once per persisted message.
/// Concurrent runs do not interfere — the engine keeps no state between
/// invocations.
pub struct NotificationEngine {
    settings: Arc<dyn SettingsReader>,
    subscriptions: Arc<dyn SubscriptionStore>,
    sender_resolver: Arc<dyn SenderResolver>,
    joiner: Arc<dyn RoomJoiner>,
    dispatcher: RecipientDispatcher,
    transforms: Vec<Arc<dyn MessageTransform>>,
}

impl NotificationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<dyn SettingsReader>,
        subscriptions: Arc<dyn SubscriptionStore>,
        permissions: Arc<dyn PermissionChecker>,
        sender_resolver: Arc<dyn SenderResolver>,
        senders: ChannelSenders,
        joiner: Arc<dyn RoomJoiner>,
        renderer: Arc<dyn NotificationRenderer>,
        side_channel: Arc<dyn SideChannel>,
    ) -> Self {
        Self {
            settings,
            subscriptions,
            sender_resolver,
            joiner,
            dispatcher: RecipientDispatcher::new(permissions, renderer, senders, side_channel),
            transforms: Vec::new(),
        }
    }

    /// Append a base-text transform. Transforms run in registration order
    /// before any recipient is dispatched.
    pub fn with_transform(mut self, transform: Arc<dyn MessageTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Fan out notifications for one freshly persisted message.
    pub async fn fan_out(&self, message: &Message, room: &Room) -> Result<Outcome, FanoutError> {
        // -- guard state ----------------------------------------------------

        if message.edited_at.is_some() {
            tracing::debug!(message_id = %message.id, "Skipping edited message");
            return Ok(Outcome::Skipped(SkipReason::Edited));
        }

        let age = (chrono::Utc::now() - message.ts).num_seconds().abs();
        if age > MAX_MESSAGE_AGE_SECS {
            tracing::debug!(message_id = %message.id, age_secs = age, "Skipping stale message");
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }

        let Some(room_kind) = room.kind else {
            tracing::debug!(room_id = %room.id, "Skipping room without a recognized type");
            return Ok(Outcome::Skipped(SkipReason::UnknownRoomKind));
        };

        let sender = match self
            .sender_resolver
            .resolve(room_kind, &message.sender_id)
            .await
            .map_err(FanoutError::Resolve)?
        {
            Some(sender) => sender,
            None => {
                tracing::debug!(
                    message_id = %message.id,
                    sender_id = %message.sender_id,
                    "Skipping message with unresolvable sender"
                );
                return Ok(Outcome::Skipped(SkipReason::UnresolvedSender));
            }
        };

        // -- preparation state ----------------------------------------------

        let mentions = MentionSet::of(message);
        let defaults = self.settings.channel_defaults();

        let max_members = self.settings.max_room_members();
        let member_count = self
            .subscriptions
            .count_by_room(&room.id)
            .await
            .map_err(FanoutError::Store)?;
        let suppressed = max_members != 0 && member_count > max_members;

        let mut base_text = message.text.clone();
        for transform in &self.transforms {
            base_text = transform.apply(base_text, message);
        }
        if !mentions.ids.is_empty() && self.settings.use_real_names() {
            base_text = replace_mentions_with_names(&base_text, &message.mentions);
        }

        // -- dispatch state -------------------------------------------------

        let query =
            EligibilityQuery::build(room, &message.sender_id, &mentions, suppressed, &defaults);
        let candidates = self
            .subscriptions
            .find_eligible(&query)
            .await
            .map_err(FanoutError::Store)?;

        let mut report = FanoutReport {
            candidates: candidates.len(),
            ..FanoutReport::default()
        };

        for subscription in &candidates {
            let request = DispatchRequest {
                subscription,
                sender: &sender,
                message,
                room,
                room_kind,
                base_text: &base_text,
                mentions: &mentions,
                suppressed,
                defaults,
            };
            match self.dispatcher.dispatch(request).await {
                Ok(DispatchResult::Sent(sent)) if sent.any() => report.dispatched += 1,
                Ok(DispatchResult::Sent(_)) => {}
                Ok(DispatchResult::Skipped(reason)) => {
                    tracing::debug!(
                        user_id = %subscription.user_id,
                        message_id = %message.id,
                        ?reason,
                        "Recipient skipped"
                    );
                }
                // One recipient's transport failure must not starve the rest.
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        user_id = %subscription.user_id,
                        message_id = %message.id,
                        error = %e,
                        "Recipient dispatch failed"
                    );
                }
            }
        }

        // -- auto-join state ------------------------------------------------

        let mut auto_join = AutoJoinOutcome::default();
        if room_kind == RoomKind::Channel && !mentions.user_ids.is_empty() {
            auto_join = self
                .auto_join_mentioned(message, room, &sender, &mentions, &base_text, &defaults)
                .await?;
            report.auto_joined = auto_join.joined;
            report.dispatched += auto_join.dispatched;
            report.failed += auto_join.failed;
        }

        tracing::info!(
            message_id = %message.id,
            room_id = %room.id,
            candidates = report.candidates,
            dispatched = report.dispatched,
            failed = report.failed,
            auto_joined = report.auto_joined,
            "Notification fan-out complete"
        );

        if !auto_join.errors.is_empty() {
            return Err(FanoutError::AutoJoin {
                attempted: auto_join.attempted,
                errors: auto_join.errors,
            });
        }

        Ok(Outcome::Completed(report))
    }

    /// Join mentioned non-members to a public channel and notify each one
    /// after their own join succeeds.
    ///
    /// Joins run concurrently with no global barrier: each user is notified
    /// off their freshly resolved subscription as soon as their own join
    /// completes. Failures are isolated per user and returned in aggregate;
    /// a newly joined mentioned user is never silenced by room size.
    async fn auto_join_mentioned(
        &self,
        message: &Message,
        room: &Room,
        sender: &User,
        mentions: &MentionSet,
        base_text: &str,
        defaults: &ChannelDefaults,
    ) -> Result<AutoJoinOutcome, FanoutError> {
        // Mentioned users who already hold a subscription are never joined
        // again (idempotence).
        let existing: HashSet<UserId> = self
            .subscriptions
            .find_by_room_and_users(&room.id, &mentions.user_ids)
            .await
            .map_err(FanoutError::Store)?
            .into_iter()
            .map(|sub| sub.user_id)
            .collect();

        let mut to_join: Vec<UserId> = Vec::new();
        for user_id in &mentions.user_ids {
            if !existing.contains(user_id) && !to_join.contains(user_id) {
                to_join.push(user_id.clone());
            }
        }

        let mut outcome = AutoJoinOutcome {
            attempted: to_join.len(),
            ..AutoJoinOutcome::default()
        };

        let mut joins: JoinSet<Result<UserId, (UserId, CollaboratorError)>> = JoinSet::new();
        for user_id in to_join {
            let joiner = Arc::clone(&self.joiner);
            let room_id = room.id.clone();
            joins.spawn(async move {
                match joiner.join(&user_id, &room_id).await {
                    Ok(()) => Ok(user_id),
                    Err(e) => Err((user_id, e)),
                }
            });
        }

        while let Some(joined) = joins.join_next().await {
            let user_id = match joined {
                Ok(Ok(user_id)) => user_id,
                Ok(Err((user_id, e))) => {
                    tracing::error!(
                        user_id = %user_id,
                        room_id = %room.id,
                        error = %e,
                        "Auto-join failed"
                    );
                    outcome.errors.push((user_id, e));
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Auto-join task panicked");
                    continue;
                }
            };
            outcome.joined += 1;

            let subscription = match self.subscriptions.find_one(&room.id, &user_id).await {
                Ok(Some(subscription)) => subscription,
                Ok(None) => {
                    tracing::warn!(
                        user_id = %user_id,
                        room_id = %room.id,
                        "Join succeeded but no subscription resolved"
                    );
                    continue;
                }
                Err(e) => {
                    outcome.errors.push((user_id, e));
                    continue;
                }
            };

            let request = DispatchRequest {
                subscription: &subscription,
                sender,
                message,
                room,
                room_kind: RoomKind::Channel,
                base_text,
                mentions,
                suppressed: false,
                defaults: *defaults,
            };
            match self.dispatcher.dispatch(request).await {
                Ok(DispatchResult::Sent(sent)) if sent.any() => outcome.dispatched += 1,
                Ok(DispatchResult::Sent(_)) => {}
                Ok(DispatchResult::Skipped(reason)) => {
                    tracing::debug!(
                        user_id = %subscription.user_id,
                        ?reason,
                        "Joined recipient skipped"
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(
                        user_id = %subscription.user_id,
                        error = %e,
                        "Dispatch to joined recipient failed"
                    );
                }
            }
        }

        Ok(outcome)
    }
}

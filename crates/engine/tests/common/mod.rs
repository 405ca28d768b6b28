//! Shared in-memory collaborators and fixture builders for the engine
//! integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use roomcast_core::eligibility::EligibilityQuery;
use roomcast_core::message::{Mention, Message};
use roomcast_core::room::{Room, RoomKind};
use roomcast_core::settings::ChannelDefaults;
use roomcast_core::subscription::{
    ChannelPreference, EmailAddress, Presence, Receiver, Subscription,
};
use roomcast_core::types::UserId;
use roomcast_core::user::User;

use roomcast_engine::collaborators::{
    AudioAlert, AudioSender, ChannelSenders, DesktopNotification, DesktopSender,
    EmailNotification, EmailSender, PermissionChecker, PlainRenderer, PushNotification,
    PushSender, RoomJoiner, SenderResolver, SentSignal, SettingsReader, SideChannel,
    SubscriptionStore,
};
use roomcast_engine::error::CollaboratorError;
use roomcast_engine::NotificationEngine;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub const ROOM_ID: &str = "r1";
pub const SENDER_ID: &str = "sender";

pub fn channel_room() -> Room {
    Room {
        id: ROOM_ID.into(),
        kind: Some(RoomKind::Channel),
        name: Some("general".into()),
    }
}

pub fn direct_room() -> Room {
    Room {
        id: ROOM_ID.into(),
        kind: Some(RoomKind::Direct),
        name: None,
    }
}

pub fn private_room() -> Room {
    Room {
        id: ROOM_ID.into(),
        kind: Some(RoomKind::Private),
        name: Some("backstage".into()),
    }
}

/// A fresh message from [`SENDER_ID`] mentioning the given ids.
pub fn message(text: &str, mention_ids: &[&str]) -> Message {
    Message {
        id: "m1".into(),
        room_id: ROOM_ID.into(),
        sender_id: SENDER_ID.into(),
        text: text.into(),
        ts: chrono::Utc::now(),
        edited_at: None,
        mentions: mention_ids
            .iter()
            .map(|id| Mention {
                id: (*id).into(),
                username: (*id).into(),
                name: None,
            })
            .collect(),
    }
}

/// An active, fully-connected subscription with no explicit preferences and
/// one verified email address.
pub fn subscription(user_id: &str) -> Subscription {
    Subscription {
        room_id: ROOM_ID.into(),
        user_id: user_id.into(),
        audio: ChannelPreference::unset(),
        desktop: ChannelPreference::unset(),
        mobile: ChannelPreference::unset(),
        email: ChannelPreference::unset(),
        desktop_duration_secs: None,
        mute_group_mentions: false,
        highlights: vec![],
        disable_notifications: false,
        ignored: vec![],
        receiver: Receiver {
            active: true,
            username: user_id.into(),
            name: None,
            language: None,
            emails: vec![EmailAddress {
                address: format!("{user_id}@example.com"),
                verified: true,
            }],
            status: Presence::Online,
            connection: Presence::Online,
        },
    }
}

pub fn sender_user() -> User {
    User {
        id: SENDER_ID.into(),
        username: SENDER_ID.into(),
        name: Some("The Sender".into()),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub struct MemorySettings {
    defaults: Mutex<ChannelDefaults>,
    max_room_members: AtomicU64,
    use_real_names: AtomicBool,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self {
            defaults: Mutex::new(ChannelDefaults::default()),
            max_room_members: AtomicU64::new(0),
            use_real_names: AtomicBool::new(false),
        }
    }

    pub fn set_defaults(&self, defaults: ChannelDefaults) {
        *self.defaults.lock().unwrap() = defaults;
    }

    pub fn set_max_room_members(&self, cap: u64) {
        self.max_room_members.store(cap, Ordering::SeqCst);
    }

    pub fn set_use_real_names(&self, on: bool) {
        self.use_real_names.store(on, Ordering::SeqCst);
    }
}

impl SettingsReader for MemorySettings {
    fn channel_defaults(&self) -> ChannelDefaults {
        *self.defaults.lock().unwrap()
    }

    fn max_room_members(&self) -> u64 {
        self.max_room_members.load(Ordering::SeqCst)
    }

    fn use_real_names(&self) -> bool {
        self.use_real_names.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Subscription store
// ---------------------------------------------------------------------------

pub struct MemoryStore {
    pub subs: Mutex<Vec<Subscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            subs: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, sub: Subscription) {
        self.subs.lock().unwrap().push(sub);
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn count_by_room(&self, room_id: &str) -> Result<u64, CollaboratorError> {
        let count = self
            .subs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.room_id == room_id)
            .count();
        Ok(count as u64)
    }

    async fn find_eligible(
        &self,
        query: &EligibilityQuery,
    ) -> Result<Vec<Subscription>, CollaboratorError> {
        Ok(self
            .subs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| query.matches(s))
            .cloned()
            .collect())
    }

    async fn find_by_room_and_users(
        &self,
        room_id: &str,
        user_ids: &[UserId],
    ) -> Result<Vec<Subscription>, CollaboratorError> {
        Ok(self
            .subs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.room_id == room_id && user_ids.contains(&s.user_id))
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<Subscription>, CollaboratorError> {
        Ok(self
            .subs
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.room_id == room_id && s.user_id == user_id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Recording senders
// ---------------------------------------------------------------------------

/// A channel payload addressed to a specific recipient.
pub trait Addressed {
    fn recipient(&self) -> &str;
}

impl Addressed for AudioAlert {
    fn recipient(&self) -> &str {
        &self.user_id
    }
}

impl Addressed for DesktopNotification {
    fn recipient(&self) -> &str {
        &self.user_id
    }
}

impl Addressed for PushNotification {
    fn recipient(&self) -> &str {
        &self.user_id
    }
}

impl Addressed for EmailNotification {
    fn recipient(&self) -> &str {
        &self.user_id
    }
}

/// Records every payload it is asked to send; individual recipients can be
/// made to fail for isolation tests.
pub struct Recording<T> {
    pub sent: Mutex<Vec<T>>,
    fail_for: Mutex<HashSet<UserId>>,
}

impl<T: Addressed> Recording<T> {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: Mutex::new(HashSet::new()),
        }
    }

    /// Sends addressed to this user will fail.
    pub fn fail_for(&self, user_id: &str) {
        self.fail_for.lock().unwrap().insert(user_id.to_string());
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn recipients(&self) -> Vec<UserId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.recipient().to_string())
            .collect()
    }

    fn record(&self, payload: T) -> Result<(), CollaboratorError> {
        if self.fail_for.lock().unwrap().contains(payload.recipient()) {
            return Err(format!("transport down for {}", payload.recipient()).into());
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }
}

#[async_trait]
impl AudioSender for Recording<AudioAlert> {
    async fn send(&self, alert: AudioAlert) -> Result<(), CollaboratorError> {
        self.record(alert)
    }
}

#[async_trait]
impl DesktopSender for Recording<DesktopNotification> {
    async fn send(&self, notification: DesktopNotification) -> Result<(), CollaboratorError> {
        self.record(notification)
    }
}

#[async_trait]
impl PushSender for Recording<PushNotification> {
    async fn send(&self, notification: PushNotification) -> Result<(), CollaboratorError> {
        self.record(notification)
    }
}

#[async_trait]
impl EmailSender for Recording<EmailNotification> {
    async fn send(&self, notification: EmailNotification) -> Result<(), CollaboratorError> {
        self.record(notification)
    }
}

// ---------------------------------------------------------------------------
// Permissions, resolver, joiner, side channel
// ---------------------------------------------------------------------------

/// Grants everything except users explicitly denied.
pub struct MemoryPermissions {
    pub denied: Mutex<HashSet<UserId>>,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self {
            denied: Mutex::new(HashSet::new()),
        }
    }

    pub fn deny(&self, user_id: &str) {
        self.denied.lock().unwrap().insert(user_id.to_string());
    }
}

#[async_trait]
impl PermissionChecker for MemoryPermissions {
    async fn has_permission(
        &self,
        user_id: &str,
        _permission: &str,
        _room_id: Option<&str>,
    ) -> Result<bool, CollaboratorError> {
        Ok(!self.denied.lock().unwrap().contains(user_id))
    }
}

/// Resolves senders from an in-memory user directory.
pub struct MemoryResolver {
    pub users: Mutex<HashMap<UserId, User>>,
}

impl MemoryResolver {
    /// Starts out knowing only [`sender_user`].
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(SENDER_ID.to_string(), sender_user());
        Self {
            users: Mutex::new(users),
        }
    }

    pub fn forget(&self, user_id: &str) {
        self.users.lock().unwrap().remove(user_id);
    }
}

#[async_trait]
impl SenderResolver for MemoryResolver {
    async fn resolve(
        &self,
        _room_kind: RoomKind,
        user_id: &str,
    ) -> Result<Option<User>, CollaboratorError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }
}

/// Joins users by inserting a default subscription into the store; join
/// attempts for users in `refuse` fail.
pub struct MemoryJoiner {
    store: Arc<MemoryStore>,
    pub joined: Mutex<Vec<UserId>>,
    pub refuse: Mutex<HashSet<UserId>>,
}

impl MemoryJoiner {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            joined: Mutex::new(Vec::new()),
            refuse: Mutex::new(HashSet::new()),
        }
    }

    pub fn refuse_user(&self, user_id: &str) {
        self.refuse.lock().unwrap().insert(user_id.to_string());
    }

    pub fn joined_users(&self) -> Vec<UserId> {
        self.joined.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomJoiner for MemoryJoiner {
    async fn join(&self, user_id: &str, room_id: &str) -> Result<(), CollaboratorError> {
        if self.refuse.lock().unwrap().contains(user_id) {
            return Err(format!("join refused for {user_id}").into());
        }
        let mut sub = subscription(user_id);
        sub.room_id = room_id.to_string();
        self.store.insert(sub);
        self.joined.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

pub struct RecordingSideChannel {
    pub signals: Mutex<Vec<SentSignal>>,
}

impl RecordingSideChannel {
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SideChannel for RecordingSideChannel {
    async fn notify_sent(&self, signal: SentSignal) -> Result<(), CollaboratorError> {
        self.signals.lock().unwrap().push(signal);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// One engine wired to in-memory collaborators, all of which stay observable
/// from the test.
pub struct Fixture {
    pub settings: Arc<MemorySettings>,
    pub store: Arc<MemoryStore>,
    pub permissions: Arc<MemoryPermissions>,
    pub resolver: Arc<MemoryResolver>,
    pub audio: Arc<Recording<AudioAlert>>,
    pub desktop: Arc<Recording<DesktopNotification>>,
    pub mobile: Arc<Recording<PushNotification>>,
    pub email: Arc<Recording<EmailNotification>>,
    pub joiner: Arc<MemoryJoiner>,
    pub side_channel: Arc<RecordingSideChannel>,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        Self {
            settings: Arc::new(MemorySettings::new()),
            permissions: Arc::new(MemoryPermissions::new()),
            resolver: Arc::new(MemoryResolver::new()),
            audio: Arc::new(Recording::new()),
            desktop: Arc::new(Recording::new()),
            mobile: Arc::new(Recording::new()),
            email: Arc::new(Recording::new()),
            joiner: Arc::new(MemoryJoiner::new(store.clone())),
            side_channel: Arc::new(RecordingSideChannel::new()),
            store,
        }
    }

    pub fn engine(&self) -> NotificationEngine {
        NotificationEngine::new(
            self.settings.clone(),
            self.store.clone(),
            self.permissions.clone(),
            self.resolver.clone(),
            ChannelSenders {
                audio: self.audio.clone(),
                desktop: self.desktop.clone(),
                mobile: self.mobile.clone(),
                email: self.email.clone(),
            },
            self.joiner.clone(),
            Arc::new(PlainRenderer),
            self.side_channel.clone(),
        )
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

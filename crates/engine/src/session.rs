use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moor_mud_common::{CombatId, Coords, Locale, MonsterId, NpcId, ObjectId, PlayerId, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::combat::CombatAction;

/// Per-connection finite state: `Connected` on accept,
/// `Menu` until the choice of login/register/quit resolves, `Authenticated`
/// for the remainder of the session's lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SessionPhase {
    Connected,
    Menu,
    Authenticated,
}

/// What a numeric room-view handle (`look 3`, `inspect 2`) refers to. The
/// table is rebuilt on every room-view render.
#[derive(Clone, Debug)]
pub enum RoomHandleEntry {
    Player(PlayerId, String),
    Npc(NpcId),
    Monster(MonsterId),
    Object(ObjectId),
}

/// One connection's mutable state. Fields are
/// individually locked rather than behind one mutex so that, e.g., a
/// combat task updating `in_combat` never contends with the dispatcher
/// reading `locale`.
pub struct SessionState {
    pub id: SessionId,
    pub phase: RwLock<SessionPhase>,
    pub player_id: RwLock<Option<PlayerId>>,
    pub username: RwLock<Option<String>>,
    pub display_name: RwLock<Option<String>>,
    pub is_admin: RwLock<bool>,
    pub coords: RwLock<Option<Coords>>,
    pub locale: RwLock<Locale>,
    pub in_combat: AtomicBool,
    pub combat_id: RwLock<Option<CombatId>>,
    pub following: RwLock<Option<String>>,
    pub last_command: RwLock<Option<String>>,
    pub last_activity: RwLock<DateTime<Utc>>,
    pub room_handles: RwLock<HashMap<u32, RoomHandleEntry>>,
    pub auth_attempts: AtomicU32,
    /// Set by the combat turn loop when it's this session's turn to act;
    /// the dispatcher's `attack`/`defend`/`flee` handlers fulfill it
    /// instead of running their normal outside-of-combat path.
    pub pending_combat_action: std::sync::Mutex<Option<oneshot::Sender<CombatAction>>>,
    /// Set by the admin `kick` command (or the idle reaper); the
    /// per-connection task checks this alongside its transport read and
    /// outbound queue in its `tokio::select!` loop.
    pub force_close: AtomicBool,
    /// Outbound line queue. The per-connection task drains this and the
    /// transport concurrently via `tokio::select!`, so broadcasts and
    /// combat narration never block on that session's own read loop.
    pub out_tx: mpsc::UnboundedSender<String>,
}

impl SessionState {
    pub fn new(id: SessionId, out_tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            phase: RwLock::new(SessionPhase::Connected),
            player_id: RwLock::new(None),
            username: RwLock::new(None),
            display_name: RwLock::new(None),
            is_admin: RwLock::new(false),
            coords: RwLock::new(None),
            locale: RwLock::new(Locale::default_locale()),
            in_combat: AtomicBool::new(false),
            combat_id: RwLock::new(None),
            following: RwLock::new(None),
            last_command: RwLock::new(None),
            last_activity: RwLock::new(Utc::now()),
            room_handles: RwLock::new(HashMap::new()),
            auth_attempts: AtomicU32::new(0),
            pending_combat_action: std::sync::Mutex::new(None),
            force_close: AtomicBool::new(false),
            out_tx,
        }
    }

    /// Requests that the per-connection task close this session's
    /// transport at its next `select!` iteration.
    pub fn request_close(&self) {
        self.force_close.store(true, Ordering::SeqCst);
    }

    pub fn should_close(&self) -> bool {
        self.force_close.load(Ordering::SeqCst)
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        *self.player_id.read().unwrap()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.phase.read().unwrap(), SessionPhase::Authenticated)
    }

    pub fn coords(&self) -> Option<Coords> {
        *self.coords.read().unwrap()
    }

    pub fn set_coords(&self, coords: Coords) {
        *self.coords.write().unwrap() = Some(coords);
    }

    pub fn locale(&self) -> Locale {
        self.locale.read().unwrap().clone()
    }

    pub fn is_admin(&self) -> bool {
        *self.is_admin.read().unwrap()
    }

    pub fn in_combat(&self) -> bool {
        self.in_combat.load(Ordering::SeqCst)
    }

    pub fn enter_combat(&self, id: CombatId) {
        self.in_combat.store(true, Ordering::SeqCst);
        *self.combat_id.write().unwrap() = Some(id);
    }

    pub fn leave_combat(&self) {
        self.in_combat.store(false, Ordering::SeqCst);
        *self.combat_id.write().unwrap() = None;
    }

    pub fn combat_id(&self) -> Option<CombatId> {
        *self.combat_id.read().unwrap()
    }

    pub fn touch(&self) {
        *self.last_activity.write().unwrap() = Utc::now();
    }

    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - *self.last_activity.read().unwrap()
    }

    /// Non-blocking: enqueues a line for this session's connection task to
    /// deliver. Safe to call from any other task (combat, broadcast,
    /// scheduler).
    pub fn send_line(&self, text: impl Into<String>) {
        let _ = self.out_tx.send(text.into());
    }

    pub fn display_name(&self) -> Option<String> {
        self.display_name.read().unwrap().clone()
    }

    pub fn set_room_handles(&self, handles: HashMap<u32, RoomHandleEntry>) {
        *self.room_handles.write().unwrap() = handles;
    }

    pub fn resolve_handle(&self, n: u32) -> Option<RoomHandleEntry> {
        self.room_handles.read().unwrap().get(&n).cloned()
    }
}

/// Owns every live session and enforces the one-session-per-player
/// invariant.
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<SessionId, std::sync::Arc<SessionState>>,
    by_player: DashMap<PlayerId, SessionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session: std::sync::Arc<SessionState>) {
        self.sessions.insert(session.id, session);
    }

    pub fn unregister(&self, id: SessionId) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            if let Some(player_id) = session.player_id() {
                self.by_player.remove_if(&player_id, |_, v| *v == id);
            }
        }
    }

    pub fn get(&self, id: SessionId) -> Option<std::sync::Arc<SessionState>> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    /// Binds `player_id` to `session`, evicting and closing any older
    /// session still holding that player id (duplicate-login invariant).
    /// Returns the evicted session, if any, so the caller can send it a
    /// "logged in elsewhere" line before closing it.
    pub fn bind_player(
        &self,
        player_id: PlayerId,
        session: &std::sync::Arc<SessionState>,
    ) -> Option<std::sync::Arc<SessionState>> {
        let previous = self
            .by_player
            .insert(player_id, session.id)
            .and_then(|old_id| self.sessions.get(&old_id).map(|s| s.clone()))
            .filter(|old| old.id != session.id);
        *session.player_id.write().unwrap() = Some(player_id);
        previous
    }

    pub fn session_for_player(&self, player_id: PlayerId) -> Option<std::sync::Arc<SessionState>> {
        let id = *self.by_player.get(&player_id)?;
        self.get(id)
    }

    pub fn authenticated_at(&self, coords: Coords) -> Vec<std::sync::Arc<SessionState>> {
        self.sessions
            .iter()
            .filter(|s| s.is_authenticated() && s.coords() == Some(coords))
            .map(|s| s.clone())
            .collect()
    }

    pub fn all_authenticated(&self) -> Vec<std::sync::Arc<SessionState>> {
        self.sessions
            .iter()
            .filter(|s| s.is_authenticated())
            .map(|s| s.clone())
            .collect()
    }

    pub fn followers_of(&self, leader_name: &str, at: Coords) -> Vec<std::sync::Arc<SessionState>> {
        self.sessions
            .iter()
            .filter(|s| {
                s.is_authenticated()
                    && s.coords() == Some(at)
                    && s.following.read().unwrap().as_deref() == Some(leader_name)
        })
            .map(|s| s.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<std::sync::Arc<SessionState>> {
        self.sessions.iter().map(|s| s.clone()).collect()
    }
}
